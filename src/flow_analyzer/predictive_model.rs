// predictive_model.rs
//
// Regressors are trained offline and exported as JSON. Two shapes are
// understood: tree ensembles (random/extra trees and gradient boosting) and
// polynomial regressions over the three feature columns.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{PredictorAppError, Result};
use crate::shared_data::FeatureVector;

/// Anything that turns an encoded feature vector into one real-valued estimate.
pub trait Predictor: fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    fn name(&self) -> &str;
}

/// The two regressors behind one model selection.
#[derive(Debug)]
pub struct ModelPair {
    pub flow: Box<dyn Predictor>,
    pub occupancy: Box<dyn Predictor>,
}

impl ModelPair {
    pub fn new(flow: Box<dyn Predictor>, occupancy: Box<dyn Predictor>) -> Self {
        Self { flow, occupancy }
    }
}

/// How tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Bagged forests average their trees.
    #[default]
    Mean,
    /// Boosted models add their trees to the base score.
    Sum,
}

/// Which side of a split a value equal to the threshold falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// Left when x <= threshold (scikit-learn, LightGBM).
    #[default]
    Le,
    /// Left when x < threshold (XGBoost).
    Lt,
}

impl SplitRule {
    fn goes_left(self, value: f64, threshold: f64) -> bool {
        match self {
            SplitRule::Le => value <= threshold,
            SplitRule::Lt => value < threshold,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    // Children always point forward, so the walk terminates.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let len = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FeatureVector::WIDTH {
                        return Err(format!("node {} splits on unknown feature {}", index, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", index));
                    }
                    for child in [left, right] {
                        if child <= index || child >= len {
                            return Err(format!("node {} has invalid child {}", index, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {} has a non-finite value", index));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64; FeatureVector::WIDTH], rule: SplitRule) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if rule.goes_left(x[feature], threshold) {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    aggregation: Aggregation,
    #[serde(default)]
    base_score: f64,
    #[serde(default)]
    split_rule: SplitRule,
    trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {}: {}", index, e))?;
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64; FeatureVector::WIDTH]) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.evaluate(x, self.split_rule))
            .sum();
        match self.aggregation {
            Aggregation::Mean => self.base_score + total / self.trees.len() as f64,
            Aggregation::Sum => self.base_score + total,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolynomialRegression {
    degree: usize,
    intercept: f64,
    coefficients: Vec<f64>,
    #[serde(skip)]
    terms: Vec<Vec<usize>>,
}

impl PolynomialRegression {
    fn prepare(&mut self) -> std::result::Result<(), String> {
        if self.degree == 0 {
            return Err("polynomial degree must be at least 1".to_string());
        }
        let terms = polynomial_terms(FeatureVector::WIDTH, self.degree);
        if terms.len() != self.coefficients.len() {
            return Err(format!(
                "degree {} needs {} coefficients, found {}",
                self.degree,
                terms.len(),
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("non-finite coefficient".to_string());
        }
        self.terms = terms;
        Ok(())
    }

    fn evaluate(&self, x: &[f64; FeatureVector::WIDTH]) -> f64 {
        self.terms
            .iter()
            .zip(&self.coefficients)
            .map(|(term, coef)| coef * term.iter().map(|&i| x[i]).product::<f64>())
            .sum::<f64>()
            + self.intercept
    }
}

/// Expanded feature index lists in PolynomialFeatures order (no bias column):
/// all degree-1 terms, then degree-2 combinations with replacement, and so on.
pub fn polynomial_terms(n_features: usize, degree: usize) -> Vec<Vec<usize>> {
    let mut terms = Vec::new();
    for d in 1..=degree {
        let mut combo = vec![0; d];
        loop {
            terms.push(combo.clone());
            let Some(pos) = (0..d).rev().find(|&i| combo[i] + 1 < n_features) else {
                break;
            };
            let next = combo[pos] + 1;
            for slot in combo.iter_mut().skip(pos) {
                *slot = next;
            }
        }
    }
    terms
}

/// A regressor exported from the training pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    TreeEnsemble(TreeEnsemble),
    Polynomial(PolynomialRegression),
}

impl RegressorArtifact {
    /// Parses and validates an artifact; the result is safe to evaluate.
    pub fn from_json(text: &str) -> std::result::Result<Self, String> {
        let mut artifact: RegressorArtifact = serde_json::from_str(text).map_err(|e| e.to_string())?;
        match &mut artifact {
            RegressorArtifact::TreeEnsemble(ensemble) => ensemble.validate()?,
            RegressorArtifact::Polynomial(poly) => poly.prepare()?,
        }
        Ok(artifact)
    }

    pub fn evaluate(&self, features: &FeatureVector) -> f64 {
        let x = features.as_array();
        match self {
            RegressorArtifact::TreeEnsemble(ensemble) => ensemble.evaluate(&x),
            RegressorArtifact::Polynomial(poly) => poly.evaluate(&x),
        }
    }
}

/// A named, loaded artifact.
#[derive(Debug, Clone)]
pub struct ArtifactRegressor {
    name: String,
    artifact: RegressorArtifact,
}

impl ArtifactRegressor {
    pub fn new(name: impl Into<String>, artifact: RegressorArtifact) -> Self {
        Self {
            name: name.into(),
            artifact,
        }
    }

    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PredictorAppError::ResourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact =
            RegressorArtifact::from_json(&text).map_err(|reason| PredictorAppError::InvalidArtifact {
                path: path.to_path_buf(),
                reason,
            })?;
        Ok(Self::new(name, artifact))
    }
}

impl Predictor for ArtifactRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        Ok(self.artifact.evaluate(features))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(hour: u8, day: u8, det: u32) -> FeatureVector {
        FeatureVector {
            hour,
            day_of_week: day,
            detid_code: det,
        }
    }

    // hour <= 7.5 ? 40 : (day <= 4.5 ? 400 : 150)
    const FOREST: &str = r#"{
        "kind": "tree_ensemble",
        "aggregation": "mean",
        "trees": [
            { "nodes": [
                { "feature": 0, "threshold": 7.5, "left": 1, "right": 2 },
                { "value": 40.0 },
                { "feature": 1, "threshold": 4.5, "left": 3, "right": 4 },
                { "value": 400.0 },
                { "value": 150.0 }
            ] },
            { "nodes": [ { "value": 100.0 } ] }
        ]
    }"#;

    #[test]
    fn forest_averages_its_trees() {
        let forest = RegressorArtifact::from_json(FOREST).unwrap();
        assert_eq!(forest.evaluate(&features(3, 0, 0)), 70.0);
        assert_eq!(forest.evaluate(&features(8, 2, 0)), 250.0);
        assert_eq!(forest.evaluate(&features(8, 6, 0)), 125.0);
    }

    #[test]
    fn boosted_trees_sum_onto_base_score() {
        let json = r#"{
            "kind": "tree_ensemble",
            "aggregation": "sum",
            "base_score": 0.5,
            "split_rule": "lt",
            "trees": [
                { "nodes": [
                    { "feature": 0, "threshold": 8.0, "left": 1, "right": 2 },
                    { "value": 1.0 },
                    { "value": 10.0 }
                ] },
                { "nodes": [ { "value": 2.0 } ] }
            ]
        }"#;
        let boosted = RegressorArtifact::from_json(json).unwrap();
        // hour 8 is not < 8, so it goes right
        assert_eq!(boosted.evaluate(&features(8, 0, 0)), 12.5);
        assert_eq!(boosted.evaluate(&features(7, 0, 0)), 3.5);
    }

    #[test]
    fn polynomial_terms_follow_expansion_order() {
        let terms = polynomial_terms(3, 2);
        assert_eq!(
            terms,
            vec![
                vec![0],
                vec![1],
                vec![2],
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 1],
                vec![1, 2],
                vec![2, 2],
            ]
        );
        assert_eq!(polynomial_terms(3, 3).len(), 19);
    }

    #[test]
    fn polynomial_evaluates_expanded_features() {
        // 2 + 1*h + 0*d + 0*det + 0.5*h^2 + ...
        let json = r#"{
            "kind": "polynomial",
            "degree": 2,
            "intercept": 2.0,
            "coefficients": [1.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 3.0, 0.0]
        }"#;
        let poly = RegressorArtifact::from_json(json).unwrap();
        // 2 + 4 + 0.5*16 + 3*(day*det) = 2 + 4 + 8 + 3*2*5
        assert_eq!(poly.evaluate(&features(4, 2, 5)), 44.0);
    }

    #[test]
    fn invalid_artifacts_are_rejected() {
        let backwards = r#"{ "kind": "tree_ensemble", "trees": [ { "nodes": [
            { "feature": 0, "threshold": 1.0, "left": 0, "right": 1 }, { "value": 1.0 } ] } ] }"#;
        assert!(RegressorArtifact::from_json(backwards).is_err());

        let bad_feature = r#"{ "kind": "tree_ensemble", "trees": [ { "nodes": [
            { "feature": 3, "threshold": 1.0, "left": 1, "right": 2 }, { "value": 1.0 }, { "value": 2.0 } ] } ] }"#;
        assert!(RegressorArtifact::from_json(bad_feature).is_err());

        let no_trees = r#"{ "kind": "tree_ensemble", "trees": [] }"#;
        assert!(RegressorArtifact::from_json(no_trees).is_err());

        let short_poly = r#"{ "kind": "polynomial", "degree": 2, "intercept": 0.0, "coefficients": [1.0, 2.0, 3.0] }"#;
        assert!(RegressorArtifact::from_json(short_poly).is_err());

        let unknown_kind = r#"{ "kind": "neural_net" }"#;
        assert!(RegressorArtifact::from_json(unknown_kind).is_err());
    }

    #[test]
    fn regressor_passes_raw_evaluation_through() {
        let json = r#"{ "kind": "polynomial", "degree": 1, "intercept": 1e308, "coefficients": [1e308, 0.0, 0.0] }"#;
        let regressor = ArtifactRegressor::new("overflow", RegressorArtifact::from_json(json).unwrap());
        assert!(regressor.predict(&features(23, 0, 0)).unwrap().is_infinite());
        assert_eq!(regressor.predict(&features(0, 0, 0)).unwrap(), 1e308);
        assert_eq!(regressor.name(), "overflow");
    }

    #[test]
    fn missing_artifact_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactRegressor::load("x", &dir.path().join("ExtraTrees_flow.json")).unwrap_err();
        assert!(err.is_resource_error());
    }
}
