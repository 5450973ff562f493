// model_registry.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::Result;
use crate::flow_analyzer::predictive_model::{ArtifactRegressor, ModelPair};
use crate::global_variables::{FLOW_ARTIFACT_SUFFIX, OCCUPANCY_ARTIFACT_SUFFIX};
use crate::shared_data::ModelSelection;

/// Source of model pairs for the registry.
pub trait ModelLoader {
    fn load_pair(&self, selection: ModelSelection) -> Result<ModelPair>;
}

/// Reads `<stem>_flow.json` and `<stem>_occ.json` from a model directory.
#[derive(Debug, Clone)]
pub struct JsonModelLoader {
    model_dir: PathBuf,
}

impl JsonModelLoader {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn artifact_paths(&self, selection: ModelSelection) -> (PathBuf, PathBuf) {
        let stem = selection.artifact_stem();
        (
            self.model_dir.join(format!("{}{}", stem, FLOW_ARTIFACT_SUFFIX)),
            self.model_dir.join(format!("{}{}", stem, OCCUPANCY_ARTIFACT_SUFFIX)),
        )
    }
}

impl ModelLoader for JsonModelLoader {
    fn load_pair(&self, selection: ModelSelection) -> Result<ModelPair> {
        let (flow_path, occ_path) = self.artifact_paths(selection);
        let flow = ArtifactRegressor::load(format!("{} (flow)", selection), &flow_path)?;
        let occupancy = ArtifactRegressor::load(format!("{} (occupancy)", selection), &occ_path)?;
        log::info!(
            "Loaded model pair {} from {} and {}",
            selection,
            flow_path.display(),
            occ_path.display()
        );
        Ok(ModelPair::new(Box::new(flow), Box::new(occupancy)))
    }
}

/// Load-once cache of model pairs. Entries are never replaced once inserted.
/// Single-threaded: the dashboard serves one request at a time.
pub struct ModelRegistry {
    loader: Box<dyn ModelLoader>,
    loaded: HashMap<ModelSelection, Rc<ModelPair>>,
}

impl ModelRegistry {
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            loaded: HashMap::new(),
        }
    }

    pub fn from_dir(model_dir: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(JsonModelLoader::new(model_dir)))
    }

    /// Returns the cached pair, loading it on first use. Failed loads are not cached.
    pub fn get_or_load(&mut self, selection: ModelSelection) -> Result<Rc<ModelPair>> {
        if let Some(pair) = self.loaded.get(&selection) {
            return Ok(Rc::clone(pair));
        }
        let pair = Rc::new(self.loader.load_pair(selection)?);
        self.loaded.insert(selection, Rc::clone(&pair));
        Ok(pair)
    }

    pub fn preload_all(&mut self) -> Result<()> {
        for selection in ModelSelection::ALL {
            self.get_or_load(selection)?;
        }
        Ok(())
    }

    pub fn is_loaded(&self, selection: ModelSelection) -> bool {
        self.loaded.contains_key(&selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictorAppError;
    use crate::flow_analyzer::predictive_model::Predictor;
    use crate::shared_data::FeatureVector;
    use std::cell::Cell;
    use std::path::Path;

    #[derive(Debug)]
    struct Constant(f64);

    impl Predictor for Constant {
        fn predict(&self, _features: &FeatureVector) -> Result<f64> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    struct CountingLoader {
        calls: Rc<Cell<usize>>,
    }

    impl ModelLoader for CountingLoader {
        fn load_pair(&self, _selection: ModelSelection) -> Result<ModelPair> {
            self.calls.set(self.calls.get() + 1);
            Ok(ModelPair::new(Box::new(Constant(1.0)), Box::new(Constant(2.0))))
        }
    }

    #[test]
    fn each_selection_is_loaded_once() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = ModelRegistry::new(Box::new(CountingLoader {
            calls: Rc::clone(&calls),
        }));

        let first = registry.get_or_load(ModelSelection::XGBoost).unwrap();
        let second = registry.get_or_load(ModelSelection::XGBoost).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        // registry entry plus the two handles above
        assert_eq!(Rc::strong_count(&first), 3);
        assert_eq!(calls.get(), 1);
        assert!(!registry.is_loaded(ModelSelection::LightGBM));

        registry.preload_all().unwrap();
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn missing_directory_is_reported_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ModelRegistry::from_dir(dir.path().join("nowhere"));
        let err = registry.get_or_load(ModelSelection::ExtraTrees).unwrap_err();
        assert!(matches!(err, PredictorAppError::ResourceUnavailable { .. }));
        assert!(!registry.is_loaded(ModelSelection::ExtraTrees));
    }

    #[test]
    fn artifact_names_use_the_stem() {
        let loader = JsonModelLoader::new("models");
        let (flow, occ) = loader.artifact_paths(ModelSelection::PolynomialReg);
        assert_eq!(flow, Path::new("models").join("PolynomialReg_flow.json"));
        assert_eq!(occ, Path::new("models").join("PolynomialReg_occ.json"));
    }
}
