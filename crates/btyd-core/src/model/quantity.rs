//! Quantities of interest and the dispatch table models provide for them.

use std::fmt;
use std::str::FromStr;

use btyd_common::{Error, RfmData, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::params::ParamVector;

/// The four predictive quantities every behavior model answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Probability each customer is still alive.
    AliveProbability,
    /// Expected purchases per customer over the next `t` periods, given
    /// their history.
    ConditionalExpectedPurchases,
    /// Expected purchases over `t` periods for a customer picked at random
    /// from the population.
    ExpectedPurchases,
    /// Probability of exactly `n` purchases over `t` periods for a random
    /// customer.
    ProbabilityOfNPurchases,
}

impl Quantity {
    pub const ALL: [Quantity; 4] = [
        Quantity::AliveProbability,
        Quantity::ConditionalExpectedPurchases,
        Quantity::ExpectedPurchases,
        Quantity::ProbabilityOfNPurchases,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quantity::AliveProbability => "alive_probability",
            Quantity::ConditionalExpectedPurchases => "conditional_expected_purchases",
            Quantity::ExpectedPurchases => "expected_purchases",
            Quantity::ProbabilityOfNPurchases => "probability_of_n_purchases",
        }
    }

    /// Short alias accepted by [`FromStr`].
    pub fn alias(&self) -> &'static str {
        match self {
            Quantity::AliveProbability => "cond_prob_alive",
            Quantity::ConditionalExpectedPurchases => "cond_n_prchs_to_time",
            Quantity::ExpectedPurchases => "n_prchs_to_time",
            Quantity::ProbabilityOfNPurchases => "prob_n_prchs_to_time",
        }
    }

    pub fn requires_t(&self) -> bool {
        !matches!(self, Quantity::AliveProbability)
    }

    pub fn requires_n(&self) -> bool {
        matches!(self, Quantity::ProbabilityOfNPurchases)
    }

    /// Population quantities yield one value per draw instead of one per
    /// customer.
    pub fn is_population(&self) -> bool {
        matches!(
            self,
            Quantity::ExpectedPurchases | Quantity::ProbabilityOfNPurchases
        )
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Quantity::ALL
            .into_iter()
            .find(|q| q.as_str() == name || q.alias() == name)
            .ok_or_else(|| Error::UnknownQuantity {
                name: s.to_string(),
            })
    }
}

/// Arguments forwarded to a quantity function.
#[derive(Debug, Clone, Copy)]
pub struct QuantityArgs<'a> {
    pub quantity: Quantity,
    pub data: Option<&'a RfmData>,
    pub t: Option<f64>,
    pub n: Option<u64>,
}

impl<'a> QuantityArgs<'a> {
    pub fn new(quantity: Quantity) -> Self {
        QuantityArgs {
            quantity,
            data: None,
            t: None,
            n: None,
        }
    }

    pub fn with_data(mut self, data: &'a RfmData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_t(mut self, t: f64) -> Self {
        self.t = Some(t);
        self
    }

    pub fn with_n(mut self, n: u64) -> Self {
        self.n = Some(n);
        self
    }

    pub fn data(&self) -> Result<&'a RfmData> {
        self.data.ok_or_else(|| self.missing("data"))
    }

    pub fn t(&self) -> Result<f64> {
        self.t.ok_or_else(|| self.missing("t"))
    }

    pub fn n(&self) -> Result<u64> {
        self.n.ok_or_else(|| self.missing("n"))
    }

    /// Check that every argument the quantity needs is present.
    pub fn check(&self) -> Result<()> {
        if self.quantity.requires_t() {
            self.t()?;
        }
        if self.quantity.requires_n() {
            self.n()?;
        }
        if !self.quantity.is_population() {
            self.data()?;
        }
        Ok(())
    }

    fn missing(&self, argument: &'static str) -> Error {
        Error::MissingArgument {
            quantity: self.quantity.to_string(),
            argument,
        }
    }
}

/// Signature shared by every quantity function.
pub type QuantityFn<M> = fn(&M, &ParamVector, &QuantityArgs<'_>) -> Result<Vec<f64>>;

/// Enum-keyed table of a model's four quantity functions.
pub struct QuantityTable<M> {
    pub alive_probability: QuantityFn<M>,
    pub conditional_expected_purchases: QuantityFn<M>,
    pub expected_purchases: QuantityFn<M>,
    pub probability_of_n_purchases: QuantityFn<M>,
}

impl<M> QuantityTable<M> {
    pub fn get(&self, quantity: Quantity) -> QuantityFn<M> {
        match quantity {
            Quantity::AliveProbability => self.alive_probability,
            Quantity::ConditionalExpectedPurchases => self.conditional_expected_purchases,
            Quantity::ExpectedPurchases => self.expected_purchases,
            Quantity::ProbabilityOfNPurchases => self.probability_of_n_purchases,
        }
    }

    /// Look up a quantity by name.
    pub fn resolve(&self, name: &str) -> Result<QuantityFn<M>> {
        Ok(self.get(name.parse()?))
    }
}

// Function pointers are Copy for any M; a derive would demand M: Copy.
impl<M> Clone for QuantityTable<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for QuantityTable<M> {}
