//! BG/NBD likelihood and quantities checked against values computed
//! independently at 30-digit precision.

use btyd_common::RfmData;
use btyd_core::model::{
    BehaviorModel, BetaGeoModel, BetaGeoParams, ParamVector, Quantity, QuantityArgs,
};

fn params(alpha: f64, r: f64, a: f64, b: f64) -> ParamVector {
    ParamVector::new(
        BetaGeoModel::NAME,
        BetaGeoModel::PARAMETER_NAMES,
        vec![alpha, r, a, b],
    )
    .unwrap()
}

fn five_customers() -> RfmData {
    RfmData::from_columns(
        (0..5).map(|i| format!("c{}", i)).collect(),
        vec![0.0, 1.0, 2.0, 3.0, 5.0],
        vec![0.0, 1.5, 3.0, 4.0, 6.0],
        vec![5.0, 5.0, 6.0, 8.0, 10.0],
        vec![0.0; 5],
    )
    .unwrap()
}

fn assert_close(actual: f64, expected: f64, rel: f64) {
    let scale = expected.abs().max(1e-300);
    assert!(
        ((actual - expected) / scale).abs() <= rel,
        "actual {} expected {}",
        actual,
        expected
    );
}

const QOI: BetaGeoParams = BetaGeoParams {
    alpha: 1.0,
    r: 0.5,
    a: 1.5,
    b: 2.0,
};

#[test]
fn log_likelihood_matches_reference_to_six_decimals() {
    let model = BetaGeoModel::default();
    let ll = model
        .log_likelihood(&five_customers(), &params(1.0, 0.5, 1.0, 2.0))
        .unwrap();
    assert!((ll - (-25.473196386289454)).abs() < 1e-6, "ll = {}", ll);
}

#[test]
fn per_customer_terms_sum_to_total() {
    let p = BetaGeoParams {
        alpha: 1.0,
        r: 0.5,
        a: 1.0,
        b: 2.0,
    };
    let expected = [
        -0.8958797346140275,
        -2.7357683843465113,
        -4.991003967850434,
        -6.894093111495584,
        -9.956451187982902,
    ];
    let data = five_customers();
    let mut total = 0.0;
    for i in 0..data.len() {
        let term = p.customer_log_likelihood(data.frequency()[i], data.recency()[i], data.T()[i]);
        assert_close(term, expected[i], 1e-9);
        total += term;
    }
    assert_close(total, -25.473196386289454, 1e-9);
}

#[test]
fn batch_likelihood_matches_single_evaluations() {
    let model = BetaGeoModel::default();
    let data = five_customers();
    let a = params(1.0, 0.5, 1.0, 2.0);
    let b = params(2.0, 0.7, 1.3, 3.1);
    let draws = btyd_core::model::ParameterDraws::new(
        BetaGeoModel::NAME,
        BetaGeoModel::PARAMETER_NAMES,
        vec![vec![1.0, 2.0], vec![0.5, 0.7], vec![1.0, 1.3], vec![2.0, 3.1]],
    )
    .unwrap();
    let batch = model.log_likelihood_batch(&data, &draws).unwrap();
    assert_eq!(batch[0], model.log_likelihood(&data, &a).unwrap());
    assert_eq!(batch[1], model.log_likelihood(&data, &b).unwrap());
}

#[test]
fn alive_probability_reference_values() {
    assert_close(QOI.alive_probability(2.0, 3.0, 6.0), 0.330507128589297, 1e-9);
    assert_close(QOI.alive_probability(5.0, 6.0, 10.0), 0.249810385941505, 1e-9);
}

#[test]
fn alive_probability_is_one_without_repeat_purchases() {
    let model = BetaGeoModel::default();
    let data = five_customers();
    let args = QuantityArgs::new(Quantity::AliveProbability).with_data(&data);
    let out = model.quantities_of_interest().get(Quantity::AliveProbability)(
        &model,
        &params(1.0, 0.5, 1.5, 2.0),
        &args,
    )
    .unwrap();
    assert_eq!(out.len(), 5);
    assert_eq!(out[0], 1.0);
    assert!(out[1..].iter().all(|p| *p > 0.0 && *p < 1.0));
}

#[test]
fn conditional_expected_purchases_reference_values() {
    assert_close(
        QOI.conditional_expected_purchases(4.0, 2.0, 3.0, 6.0),
        0.374615541835425,
        1e-8,
    );
    assert_close(
        QOI.conditional_expected_purchases(4.0, 0.0, 0.0, 5.0),
        0.278127606386159,
        1e-8,
    );
}

#[test]
fn conditional_expected_purchases_survives_hypergeometric_overflow() {
    // ln 2F1 is about 1865 here, far beyond f64 range for the direct value.
    let p = BetaGeoParams {
        alpha: 0.01,
        r: 0.5,
        a: 1.5,
        b: 2.0,
    };
    let value = p.conditional_expected_purchases(10.0, 300.0, 0.01, 0.01);
    assert!(value.is_finite());
    assert_close(value, 575.01522683743, 1e-6);
}

#[test]
fn expected_purchases_reference_value() {
    assert_close(QOI.expected_purchases(4.0), 1.00597656799545, 1e-9);
}

#[test]
fn probability_of_n_purchases_reference_values() {
    assert_close(QOI.probability_of_n_purchases(4.0, 0), 0.447213595499958, 1e-9);
    assert_close(QOI.probability_of_n_purchases(4.0, 1), 0.339128709471437, 1e-9);
    assert_close(QOI.probability_of_n_purchases(4.0, 3), 0.0475200870088365, 1e-8);
}

#[test]
fn probability_of_n_purchases_is_a_distribution_with_the_right_mean() {
    let mut total = 0.0;
    let mut mean = 0.0;
    for n in 0..300u64 {
        let p = QOI.probability_of_n_purchases(4.0, n);
        assert!((0.0..=1.0).contains(&p), "P({}) = {}", n, p);
        total += p;
        mean += n as f64 * p;
    }
    assert!((total - 1.0).abs() < 1e-8, "total = {}", total);
    assert!((mean - QOI.expected_purchases(4.0)).abs() < 1e-6, "mean = {}", mean);
}

#[test]
fn population_quantities_return_one_value_per_draw() {
    let model = BetaGeoModel::default();
    let table = model.quantities_of_interest();
    let p = params(1.0, 0.5, 1.5, 2.0);
    let args = QuantityArgs::new(Quantity::ProbabilityOfNPurchases)
        .with_t(4.0)
        .with_n(1);
    let out = table.get(Quantity::ProbabilityOfNPurchases)(&model, &p, &args).unwrap();
    assert_eq!(out.len(), 1);
    assert_close(out[0], 0.339128709471437, 1e-9);
}
