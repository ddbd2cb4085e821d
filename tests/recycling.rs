use mortgage_recycle_rs::{
    amortization_diff, ConvergenceStatus, Investment, Loan, MarketAssumptions, Money, Mortgage,
    MortgageRecycleInvestment, Rate, RecycleConfig, RecycleEvent, RecycleMode,
    StocksMarketInvestment,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const LOAN_TABLE: &str = r#"[
    {"amount": 600000, "num_of_months": 360, "interest_rate": 4.0, "loan_type": "Kalatz"},
    {"amount": 300000, "num_of_months": 240, "interest_rate": 3.0, "loan_type": "KvoaTsmoda", "cpi": "yes"}
]"#;

fn home() -> Mortgage {
    Mortgage::new(
        "Home",
        vec![
            Loan::new(
                Money::from_major(600_000),
                360,
                Rate::from_percentage(dec!(4)),
                Rate::ZERO,
                0,
            )
            .unwrap(),
            Loan::new(
                Money::from_major(300_000),
                240,
                Rate::from_percentage(dec!(3)),
                Rate::ZERO,
                0,
            )
            .unwrap(),
        ],
    )
}

/// index-linked loan in grace, an index-linked amortizing loan and a plain loan
fn mixed() -> Mortgage {
    let cpi = Rate::from_percentage(dec!(2.5));
    Mortgage::new(
        "Mixed",
        vec![
            Loan::new(Money::from_major(400_000), 300, Rate::from_percentage(dec!(3)), cpi, 12)
                .unwrap(),
            Loan::new(Money::from_major(250_000), 360, Rate::from_percentage(dec!(5)), Rate::ZERO, 0)
                .unwrap(),
            Loan::new(Money::from_major(150_000), 240, Rate::from_percentage(dec!(2)), cpi, 0)
                .unwrap(),
        ],
    )
}

#[test]
fn test_aggregate_figures() {
    let mortgage = home();

    assert_eq!(mortgage.loan_amount(), Money::from_major(900_000));
    assert_eq!(mortgage.num_months(), 360);
    let rate = mortgage.average_interest_rate().as_decimal();
    assert!((rate - dec!(0.0366667)).abs() < dec!(0.000001));
    assert_eq!(
        mortgage.first_payment(),
        mortgage.loans()[0].first_payment() + mortgage.loans()[1].first_payment()
    );
}

#[test]
fn test_lump_sum_is_conserved() {
    let mortgage = home();
    let extra = Money::from_major(123_456);

    for mode in [RecycleMode::ReducePayment, RecycleMode::ReducePeriod] {
        let result = mortgage.recycle(extra, mode, &RecycleConfig::default()).unwrap();
        assert_eq!(result.total_applied(), extra);
        assert_eq!(result.unapplied, Money::ZERO);
        assert_eq!(result.mortgage.loan_amount(), mortgage.loan_amount() - extra);
    }
}

#[test]
fn test_recycling_leaves_the_original_untouched() {
    let mortgage = home();
    let before = mortgage.clone();

    let result = mortgage
        .recycle(Money::from_major(100_000), RecycleMode::ReducePeriod, &RecycleConfig::default())
        .unwrap();

    assert_eq!(mortgage, before);
    assert_eq!(result.mortgage.name(), "Recycled Home");
    assert!(result.mortgage.num_months() <= mortgage.num_months());
    assert!(result.mortgage.total_interest_payments(None) < mortgage.total_interest_payments(None));
}

#[test]
fn test_zero_extra_is_a_no_op() {
    let mortgage = home();
    let result = mortgage
        .recycle(Money::ZERO, RecycleMode::ReducePayment, &RecycleConfig::default())
        .unwrap();

    assert!(result.allocations.is_empty());
    assert_eq!(result.iterations, 0);
    assert_eq!(result.mortgage.schedule(), mortgage.schedule());
}

#[test]
fn test_extra_beyond_balance_repays_everything() {
    let mortgage = home();
    let result = mortgage
        .recycle(Money::from_major(1_000_000), RecycleMode::ReducePeriod, &RecycleConfig::default())
        .unwrap();

    assert!(result.mortgage.is_fully_repaid());
    assert_eq!(result.mortgage.num_months(), 0);
    assert_eq!(result.unapplied, Money::from_major(100_000));
    assert_eq!(result.total_applied(), Money::from_major(900_000));
    assert!(result
        .events
        .iter()
        .any(|e| matches!(e, RecycleEvent::SurplusReturned { .. })));
}

#[test]
fn test_negative_extra_is_rejected() {
    let err = home()
        .recycle(Money::from_major(-1), RecycleMode::ReducePayment, &RecycleConfig::default())
        .unwrap_err();
    assert!(!err.is_no_solution());
}

#[test]
fn test_diff_with_itself_is_zero() {
    let mortgage = home();
    let diff = amortization_diff(&mortgage, &mortgage);

    assert_eq!(diff.num_months(), 360);
    assert_eq!(diff.total_payments(None), Money::ZERO);
    assert_eq!(diff.total_interest_payments(None), Money::ZERO);
    assert_eq!(diff.balance_after_payment(120), Money::ZERO);
}

#[test]
fn test_diff_reports_savings() {
    let mortgage = home();
    let result = mortgage
        .recycle(Money::from_major(100_000), RecycleMode::ReducePayment, &RecycleConfig::default())
        .unwrap();
    let diff = amortization_diff(&mortgage, &result.mortgage);

    assert!(diff.payment_amount(1).is_positive());
    assert!(diff.total_interest_payments(None).is_positive());
    assert_eq!(
        diff.total_interest_payments(None),
        mortgage.total_interest_payments(None) - result.mortgage.total_interest_payments(None)
    );
}

#[test]
fn test_monthly_increase_shortens_the_mortgage() {
    let mortgage = home();
    let result = mortgage
        .recycle_monthly(Money::from_major(500), &RecycleConfig::default())
        .unwrap();

    assert!(result.applied_change.is_positive());
    assert!(result.applied_change <= Money::from_major(500));
    assert_eq!(result.baseline_payment, mortgage.first_payment());
    assert_eq!(result.new_first_payment, result.mortgage.first_payment());
    assert!(result.mortgage.total_interest_payments(None) < mortgage.total_interest_payments(None));
    if let ConvergenceStatus::Partial { unapplied } = result.status {
        assert!(unapplied.is_positive());
    }
}

#[test]
fn test_loan_table_end_to_end() {
    let assumptions = MarketAssumptions::default();
    let mortgage = Mortgage::from_json("Home", LOAN_TABLE, &assumptions).unwrap();

    assert_eq!(mortgage.len(), 2);
    assert!(mortgage.loans()[1].is_indexed());
    assert!(!mortgage.loans()[0].is_indexed());

    let investment = MortgageRecycleInvestment::new(
        Money::from_major(100_000),
        &mortgage,
        RecycleMode::ReducePayment,
        &assumptions,
        &RecycleConfig::default(),
    )
    .unwrap();
    let stocks = StocksMarketInvestment::new(Money::from_major(100_000), &assumptions);

    assert!(investment.irr(10).unwrap().as_decimal() > dec!(0));
    assert!(stocks.irr(10).unwrap().as_decimal() > dec!(0));
    assert_eq!(investment.generate_schedule(10).unwrap().len(), 120);

    let json = mortgage.view().to_json_pretty().unwrap();
    assert!(json.contains("Total Mortgage"));
}

#[test]
fn test_mixed_mortgage_conserves_every_extra() {
    let mortgage = mixed();
    let config = RecycleConfig::default();
    let baseline = mortgage.first_payment();

    for extra in [1_000, 77_777, 333_333, 799_999] {
        let extra = Money::from_major(extra);
        for mode in [RecycleMode::ReducePayment, RecycleMode::ReducePeriod] {
            let result = mortgage.recycle(extra, mode, &config).unwrap();

            assert_eq!(result.total_applied(), extra);
            assert_eq!(result.unapplied, Money::ZERO);
            assert_eq!(result.mortgage.loan_amount(), mortgage.loan_amount() - extra);
            assert!(result.mortgage.first_payment() <= baseline + config.tolerance);
        }
    }
}

#[test]
fn test_mixed_mortgage_period_mode_leaves_grace_loan_to_the_lump_sum() {
    let mortgage = mixed();
    let grace_id = mortgage.loans()[0].id();
    let result = mortgage
        .recycle(Money::from_major(100_000), RecycleMode::ReducePeriod, &RecycleConfig::default())
        .unwrap();

    if let Some(adjustment) = &result.payment_adjustment {
        assert!(adjustment.events.iter().all(|e| match e {
            RecycleEvent::FirstPaymentChanged { loan_id, .. }
            | RecycleEvent::LoanSaturated { loan_id, .. } => *loan_id != grace_id,
            _ => true,
        }));
    }
    let grace = result
        .mortgage
        .loans()
        .iter()
        .find(|l| l.id() == grace_id)
        .unwrap();
    assert_eq!(grace.grace_period(), 12);
    assert_eq!(grace.first_payment(), Money::ZERO);
}

#[test]
fn test_zero_amount_rows_do_not_stretch_the_schedule() {
    let table = r#"[
        {"amount": 12000, "num_of_months": 6, "interest_rate": 0},
        {"amount": 0, "num_of_months": 12, "interest_rate": 3.0}
    ]"#;
    let mortgage = Mortgage::from_json("Table", table, &MarketAssumptions::default()).unwrap();

    assert_eq!(mortgage.len(), 2);
    assert_eq!(mortgage.num_months(), 6);
    assert_eq!(mortgage.schedule().num_months(), 6);
    assert_eq!(amortization_diff(&mortgage, &mortgage).num_months(), 6);
}
