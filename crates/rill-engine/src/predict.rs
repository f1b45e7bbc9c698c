//! Advisory type prediction.
//!
//! A [`TypeLearner`] observes what type each named operation produced
//! for a given argument shape and predicts the likely result type of
//! future applications. Predictions are hints only: nothing in the
//! engine branches on them.

use dashmap::DashMap;
use rill_value::{Type, Value};
use std::collections::HashMap;

/// Observed result-type counts for one operation/argument shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypePrediction {
    counts: HashMap<Type, u64>,
}

impl TypePrediction {
    pub fn empty() -> TypePrediction {
        TypePrediction::default()
    }

    pub fn record(&mut self, ty: Type, count: u64) {
        *self.counts.entry(ty).or_insert(0) += count;
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn count_of(&self, ty: Type) -> u64 {
        self.counts.get(&ty).copied().unwrap_or(0)
    }

    /// The most frequently observed type, if anything was observed.
    pub fn probable_type(&self) -> Option<Type> {
        self.counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(ty, _)| *ty)
    }

    /// Fraction of observations that produced `ty`.
    pub fn probability(&self, ty: Type) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.count_of(ty) as f64 / total as f64
        }
    }
}

/// Learns result types per named operation and argument shape.
pub trait TypeLearner: Send + Sync {
    fn learn(&self, name: &str, inputs: &[Value], result_type: Type);
    fn predict(&self, name: &str, inputs: &[Value]) -> Option<TypePrediction>;
}

/// Frequency-counting learner keyed by operation name plus the type
/// signature of the arguments.
#[derive(Debug, Default)]
pub struct CountBasedTypeLearner {
    table: DashMap<String, TypePrediction>,
}

impl CountBasedTypeLearner {
    pub fn new() -> CountBasedTypeLearner {
        CountBasedTypeLearner::default()
    }

    fn key(name: &str, inputs: &[Value]) -> String {
        let mut key = String::from(name);
        key.push('(');
        for (i, input) in inputs.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(input.type_of().name());
        }
        key.push(')');
        key
    }
}

impl TypeLearner for CountBasedTypeLearner {
    fn learn(&self, name: &str, inputs: &[Value], result_type: Type) {
        self.table
            .entry(CountBasedTypeLearner::key(name, inputs))
            .or_default()
            .record(result_type, 1);
    }

    fn predict(&self, name: &str, inputs: &[Value]) -> Option<TypePrediction> {
        self.table
            .get(&CountBasedTypeLearner::key(name, inputs))
            .map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_operations_have_no_prediction() {
        let learner = CountBasedTypeLearner::new();
        assert!(learner.predict("mystery", &[]).is_none());
    }

    #[test]
    fn majority_type_wins() {
        let learner = CountBasedTypeLearner::new();
        let args = [Value::from(1), Value::from(2)];
        learner.learn("plus", &args, Type::Integer);
        learner.learn("plus", &args, Type::Integer);
        learner.learn("plus", &args, Type::Decimal);
        let prediction = learner.predict("plus", &args).unwrap();
        assert_eq!(prediction.probable_type(), Some(Type::Integer));
        assert!((prediction.probability(Type::Integer) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn argument_shape_separates_entries() {
        let learner = CountBasedTypeLearner::new();
        learner.learn("plus", &[1.into(), 2.into()], Type::Integer);
        learner.learn("plus", &["a".into(), "b".into()], Type::String);
        let ints = learner.predict("plus", &[5.into(), 6.into()]).unwrap();
        assert_eq!(ints.probable_type(), Some(Type::Integer));
        let strs = learner.predict("plus", &["x".into(), "y".into()]).unwrap();
        assert_eq!(strs.probable_type(), Some(Type::String));
    }
}
