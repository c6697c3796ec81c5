//! Model handle behaviour with a deterministic engine: fit state,
//! quantity dispatch, argument checks and failure isolation.

mod support;

use btyd_common::{Error, RfmTable};
use btyd_core::{BetaGeoModel, BtydModel, PredictRequest, Quantity};
use rand::rngs::StdRng;
use rand::SeedableRng;
use support::{five_customer_table, FailingEngine, FixedEngine};

fn fitted() -> BtydModel<BetaGeoModel> {
    let mut model = BtydModel::new(BetaGeoModel::default())
        .with_engine(Box::new(FixedEngine::beta_geo(1.0, 0.5, 1.5, 2.0).with_spread(0.05)));
    model.fit(&five_customer_table(), 0, 30).unwrap();
    model
}

#[test]
fn predict_before_fit_is_not_fitted() {
    let model = BtydModel::new(BetaGeoModel::default());
    let err = model
        .predict(&PredictRequest::new(Quantity::ExpectedPurchases).with_t(4.0))
        .unwrap_err();
    assert!(matches!(err, Error::NotFitted), "got {err}");
    assert!(matches!(model.point_estimates(), Err(Error::NotFitted)));
    assert!(!model.is_fitted());
}

#[test]
fn fit_records_posterior_and_provenance() {
    let model = fitted();
    assert!(model.is_fitted());
    assert!(model.fit_id().is_some());
    assert_eq!(model.data().map(|d| d.len()), Some(5));

    let estimates = model.point_estimates().unwrap();
    for name in ["alpha", "r", "a", "b", "phi", "kappa"] {
        assert!(estimates.contains_key(name), "missing {name}");
    }
    assert!((estimates["alpha"] - 1.0).abs() < 1e-12);
    assert!((estimates["b"] - 2.0).abs() < 1e-12);
}

#[test]
fn unknown_quantity_name_is_rejected_without_touching_state() {
    let model = fitted();
    let before = model.point_estimates().unwrap();

    let err = model.predict_named("bogus_name", Some(4.0), None).unwrap_err();
    assert!(matches!(err, Error::UnknownQuantity { ref name } if name == "bogus_name"));
    assert_eq!(model.point_estimates().unwrap(), before);
}

#[test]
fn short_aliases_dispatch_like_canonical_names() {
    let model = fitted();
    let by_alias = model.predict_named("n_prchs_to_time", Some(4.0), None).unwrap();
    let canonical = model.predict_named("expected_purchases", Some(4.0), None).unwrap();
    assert_eq!(by_alias.values, canonical.values);
}

#[test]
fn point_mode_gives_one_row_at_posterior_means() {
    let model = fitted();
    let pred = model
        .predict(&PredictRequest::new(Quantity::ExpectedPurchases).with_t(4.0))
        .unwrap();
    assert_eq!((pred.rows, pred.cols), (1, 1));
    assert!((pred.values[0] - 1.00597656799545).abs() < 1e-9);
    assert!(pred.customer_ids.is_empty());
}

#[test]
fn posterior_mode_has_one_row_per_draw_and_one_column_per_customer() {
    let model = fitted();
    let mut rng = StdRng::seed_from_u64(5);

    let one = model
        .predict_with_rng(
            &PredictRequest::new(Quantity::ConditionalExpectedPurchases)
                .with_t(4.0)
                .sample_posterior(1),
            &mut rng,
        )
        .unwrap();
    assert_eq!((one.rows, one.cols), (1, 5));

    let many = model
        .predict_with_rng(
            &PredictRequest::new(Quantity::AliveProbability).sample_posterior(40),
            &mut rng,
        )
        .unwrap();
    assert_eq!((many.rows, many.cols), (40, 5));
    assert_eq!(many.values.len(), 200);
    assert_eq!(many.customer_ids, vec!["c0", "c1", "c2", "c3", "c4"]);
    assert!(many.is_finite());
    // Customer c0 never repurchased.
    assert!((0..40).all(|i| many.row(i).unwrap()[0] == 1.0));
}

#[test]
fn missing_arguments_are_reported_per_quantity() {
    let model = fitted();

    let err = model
        .predict(&PredictRequest::new(Quantity::ExpectedPurchases))
        .unwrap_err();
    assert!(matches!(err, Error::MissingArgument { argument: "t", .. }), "got {err}");

    let err = model
        .predict(&PredictRequest::new(Quantity::ProbabilityOfNPurchases).with_t(2.0))
        .unwrap_err();
    assert!(matches!(err, Error::MissingArgument { argument: "n", .. }), "got {err}");
}

#[test]
fn negative_horizon_and_zero_draws_are_rejected() {
    let model = fitted();
    let err = model
        .predict(&PredictRequest::new(Quantity::ExpectedPurchases).with_t(-1.0))
        .unwrap_err();
    assert!(matches!(err, Error::InputValidation { ref field, .. } if field == "t"));

    let err = model
        .predict(
            &PredictRequest::new(Quantity::ExpectedPurchases)
                .with_t(1.0)
                .sample_posterior(0),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InputValidation { .. }));
}

#[test]
fn zero_horizon_predicts_nothing() {
    let model = fitted();
    let pred = model
        .predict(&PredictRequest::new(Quantity::ConditionalExpectedPurchases).with_t(0.0))
        .unwrap();
    assert!(pred.values.iter().all(|v| *v == 0.0));
    let pred = model
        .predict(
            &PredictRequest::new(Quantity::ProbabilityOfNPurchases)
                .with_t(0.0)
                .with_n(0),
        )
        .unwrap();
    assert!((pred.values[0] - 1.0).abs() < 1e-12);
}

#[test]
fn table_override_replaces_fit_data() {
    let model = fitted();
    let table = RfmTable::new()
        .with_labels("ID", vec!["x".into(), "y".into()])
        .with_numbers("FREQUENCY", vec![2.0, 5.0])
        .with_numbers("RECENCY", vec![3.0, 6.0])
        .with_numbers("T", vec![6.0, 10.0])
        .with_numbers("MONETARY_VALUE", vec![1.0, 1.0]);
    let pred = model
        .predict(&PredictRequest::new(Quantity::AliveProbability).with_table(table))
        .unwrap();
    assert_eq!((pred.rows, pred.cols), (1, 2));
    assert_eq!(pred.customer_ids, vec!["x", "y"]);
    assert!((pred.values[0] - 0.330507128589297).abs() < 1e-9);
    assert!((pred.values[1] - 0.249810385941505).abs() < 1e-9);
}

#[test]
fn recency_beyond_observation_window_fails_the_fit() {
    let table = RfmTable::new()
        .with_numbers("FREQUENCY", vec![1.0])
        .with_numbers("RECENCY", vec![6.0])
        .with_numbers("T", vec![5.0])
        .with_numbers("MONETARY_VALUE", vec![0.0]);
    let mut model = BtydModel::new(BetaGeoModel::default())
        .with_engine(Box::new(FixedEngine::beta_geo(1.0, 0.5, 1.5, 2.0)));
    let err = model.fit(&table, 0, 3).unwrap_err();
    assert!(matches!(err, Error::InputValidation { ref field, .. } if field == "recency"));
    assert!(!model.is_fitted());
}

#[test]
fn missing_column_fails_the_fit() {
    let table = RfmTable::new()
        .with_numbers("FREQUENCY", vec![1.0])
        .with_numbers("T", vec![5.0])
        .with_numbers("MONETARY_VALUE", vec![0.0]);
    let mut model = BtydModel::new(BetaGeoModel::default());
    let err = model.fit(&table, 0, 3).unwrap_err();
    assert!(matches!(err, Error::MissingColumn { ref column } if column == "RECENCY"));
}

#[test]
fn failed_refit_keeps_previous_posterior() {
    let model = fitted();
    let before = model.point_estimates().unwrap();
    let fit_id = model.fit_id();

    let mut model = model.with_engine(Box::new(FailingEngine));
    let err = model.fit(&five_customer_table(), 0, 30).unwrap_err();
    assert!(matches!(err, Error::InferenceFailure(_)), "got {err}");

    assert_eq!(model.point_estimates().unwrap(), before);
    assert_eq!(model.fit_id(), fit_id);
    assert_eq!(model.data().map(|d| d.len()), Some(5));
}

#[test]
fn summary_reports_parameters_and_customer_count() {
    let mut model = BtydModel::new(BetaGeoModel::default())
        .with_engine(Box::new(FixedEngine::beta_geo(1.0, 0.5, 1.5, 2.0)));
    assert_eq!(model.summary().to_string(), "<btyd.BetaGeoModel: not fitted>");

    model.fit(&five_customer_table(), 0, 3).unwrap();
    assert_eq!(
        model.summary().to_string(),
        "<btyd.BetaGeoModel: Parameters {alpha: 1.000, r: 0.500, a: 1.500, b: 2.000} \
         estimated with 5 customers.>"
    );
}

#[test]
fn generated_data_cycles_fit_windows() {
    let model = fitted();
    let mut rng = StdRng::seed_from_u64(21);
    let synthetic = model.generate_rfm_data_with_rng(12, &mut rng).unwrap();
    assert_eq!(synthetic.len(), 12);
    let windows = model.data().unwrap().T();
    for (i, t) in synthetic.t.iter().enumerate() {
        assert_eq!(*t, windows[i % windows.len()]);
    }
    for i in 0..synthetic.len() {
        assert!(synthetic.recency[i] <= synthetic.t[i]);
        assert!(synthetic.frequency[i] >= 0.0);
    }
}

#[test]
fn unfitted_generation_uses_prior_defaults() {
    let model = BtydModel::new(BetaGeoModel::default());
    let mut rng = StdRng::seed_from_u64(3);
    let synthetic = model.generate_rfm_data_with_rng(8, &mut rng).unwrap();
    assert_eq!(synthetic.len(), 8);
    assert!(synthetic.t.iter().all(|t| *t == 1.0));
}
