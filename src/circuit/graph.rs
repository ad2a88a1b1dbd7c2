//! Circuit graph structure.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::types::{BranchId, NodeId, VarIndex, GROUND_NAME};
use crate::components::{Element, MmfSource, Permeance, PhiSource};
use crate::error::{EmcError, Result};
use crate::material::{BhModel, ModelKind, ModelParams};

/// Registry of material models keyed by label.
pub type ModelRegistry = HashMap<String, Arc<BhModel>>;

/// A magnetic circuit ready for simulation.
///
/// The ordered element list and the node-name map are kept apart: element
/// order fixes the numbering of MMF-source branch fluxes, while the node map
/// alone defines the topology.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Circuit title, printed as the first line of the netlist
    title: String,

    /// All elements in insertion order
    elements: Vec<Element>,

    /// Mapping from node names to node IDs
    node_map: HashMap<String, NodeId>,

    /// Reverse mapping from node IDs to names
    node_names: Vec<String>,

    /// Number of MMF-source branch flux variables
    num_branches: usize,

    /// Material models available to permeances
    models: ModelRegistry,
}

impl Circuit {
    /// Create an empty circuit containing only the ground node.
    pub fn new(title: impl Into<String>) -> Self {
        let mut node_map = HashMap::new();
        node_map.insert(GROUND_NAME.to_string(), NodeId::GROUND);

        Self {
            title: title.into(),
            elements: Vec::new(),
            node_map,
            node_names: vec![GROUND_NAME.to_string()],
            num_branches: 0,
            models: HashMap::new(),
        }
    }

    /// Get the circuit title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Name of the reference node.
    pub fn ground_node(&self) -> &'static str {
        GROUND_NAME
    }

    /// Create a new node.
    ///
    /// Fails if a node with the same name exists, except for ground which
    /// may be "created" any number of times.
    pub fn create_node(&mut self, name: &str) -> Result<String> {
        if name != GROUND_NAME && self.node_map.contains_key(name) {
            return Err(EmcError::DuplicateNode {
                node: name.to_string(),
            });
        }
        self.add_node(name);
        Ok(name.to_string())
    }

    /// Add a node if it is not already present and return its ID.
    ///
    /// Node IDs are assigned from 1 upwards in the order names are first seen.
    pub fn add_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.node_map.get(name) {
            return id;
        }
        let id = NodeId(self.node_names.len());
        self.node_map.insert(name.to_string(), id);
        self.node_names.push(name.to_string());
        id
    }

    /// Number of nodes, ground included.
    pub fn node_count(&self) -> usize {
        self.node_names.len()
    }

    /// Number of MMF sources, each contributing one branch-flux unknown.
    pub fn mmf_count(&self) -> usize {
        self.num_branches
    }

    /// Get the total size of the solution vector.
    pub fn matrix_size(&self) -> usize {
        // Nodes (excluding ground) + MMF-source branch fluxes
        (self.node_count() - 1) + self.num_branches
    }

    /// Get the matrix index for a node potential.
    /// Returns None for ground (node 0).
    pub fn node_index(&self, node: NodeId) -> Option<usize> {
        if node.is_ground() {
            None
        } else {
            Some(VarIndex::Potential(node).to_index(self.node_count()))
        }
    }

    /// Get the matrix index for an MMF-source branch flux.
    pub fn branch_index(&self, branch: BranchId) -> usize {
        VarIndex::Flux(branch).to_index(self.node_count())
    }

    /// Find a node ID by name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_map.get(name).copied()
    }

    /// Get the name of a node, or `None` if the ID is not from this circuit.
    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.node_names.get(node.0).map(String::as_str)
    }

    /// Instantiate a material model of the given kind and register it under `label`.
    ///
    /// An existing model with the same label is replaced.
    pub fn add_model(&mut self, kind: &str, label: &str, params: ModelParams) -> Result<()> {
        let model = match kind.parse::<ModelKind>()? {
            ModelKind::Bh => BhModel::from_file(&params.path, params.coefficients)?,
        };
        self.add_material(label, model);
        Ok(())
    }

    /// Register an already built material model under `label`, returning the
    /// model it replaced.
    pub fn add_material(
        &mut self,
        label: &str,
        model: impl Into<Arc<BhModel>>,
    ) -> Option<Arc<BhModel>> {
        self.models.insert(label.to_string(), model.into())
    }

    /// Remove a model from the registry. Unknown labels are ignored.
    ///
    /// Permeances still bound to the label are reported by
    /// [`validate_circuit`](super::validate_circuit).
    pub fn remove_model(&mut self, label: &str) -> Option<Arc<BhModel>> {
        self.models.remove(label)
    }

    /// Look up a registered model.
    pub fn model(&self, label: &str) -> Option<&BhModel> {
        self.models.get(label).map(|m| m.as_ref())
    }

    /// Add a permeance between `n1` and `n2`, creating the nodes if needed.
    ///
    /// Geometry (mm) must be non-zero and `model`, if given, must already be
    /// registered. A rejected call leaves the circuit unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn add_permeance(
        &mut self,
        name: &str,
        n1: &str,
        n2: &str,
        mur: f64,
        width: f64,
        depth: f64,
        length: f64,
        model: Option<&str>,
    ) -> Result<()> {
        self.check_unique_name(name)?;

        for (param, value) in [("width", width), ("depth", depth), ("length", length)] {
            if value == 0.0 || !value.is_finite() {
                return Err(EmcError::invalid_parameter(
                    name,
                    param,
                    format!("must be finite and non-zero, got {}", value),
                ));
            }
        }

        if let Some(label) = model {
            if !self.models.contains_key(label) {
                return Err(EmcError::UndefinedModel {
                    model: label.to_string(),
                    element: name.to_string(),
                });
            }
        }

        let nodes = [self.add_node(n1), self.add_node(n2)];
        self.elements.push(Element::Permeance(Permeance::new(
            name.to_string(),
            nodes,
            mur,
            width,
            depth,
            length,
            model.map(str::to_string),
        )));
        Ok(())
    }

    /// Add an MMF source driving `value` from `n2` to `n1`, i.e. `U[n1] - U[n2] = value`.
    pub fn add_mmf_source(&mut self, name: &str, n1: &str, n2: &str, value: f64) -> Result<()> {
        self.check_unique_name(name)?;

        let nodes = [self.add_node(n1), self.add_node(n2)];
        let branch = BranchId(self.num_branches);
        self.num_branches += 1;
        self.elements.push(Element::MmfSource(MmfSource::new(
            name.to_string(),
            nodes,
            value,
            branch,
        )));
        Ok(())
    }

    /// Add a flux source delivering `value` into `n1` and drawing it from `n2`.
    pub fn add_phi_source(&mut self, name: &str, n1: &str, n2: &str, value: f64) -> Result<()> {
        self.check_unique_name(name)?;

        let nodes = [self.add_node(n1), self.add_node(n2)];
        self.elements
            .push(Element::PhiSource(PhiSource::new(name.to_string(), nodes, value)));
        Ok(())
    }

    /// Get an element by name (case-insensitive).
    pub fn get_element(&self, name: &str) -> Result<&Element> {
        self.elements
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| EmcError::ElementNotFound {
                name: name.to_string(),
            })
    }

    /// All elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Self-check: do two elements share a name?
    pub fn has_duplicate_elements(&self) -> bool {
        self.first_duplicate_element().is_some()
    }

    /// First element whose name (case-insensitively) repeats an earlier one.
    pub fn first_duplicate_element(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.elements
            .iter()
            .map(|e| e.name())
            .find(|name| !seen.insert(name.to_ascii_lowercase()))
    }

    /// Mutable elements together with the model registry they refer to.
    ///
    /// Only the solver writes through this, to refresh operating points.
    pub(crate) fn elements_and_models_mut(&mut self) -> (&mut [Element], &ModelRegistry) {
        (self.elements.as_mut_slice(), &self.models)
    }

    /// Labels referenced by permeances that are missing from the registry,
    /// as `(element, model)` pairs.
    pub(crate) fn unresolved_models(&self) -> Vec<(&str, &str)> {
        self.elements
            .iter()
            .filter_map(Element::as_permeance)
            .filter_map(|p| p.model.as_deref().map(|m| (p.name.as_str(), m)))
            .filter(|(_, m)| !self.models.contains_key(*m))
            .collect()
    }

    /// Flux through `element` from `n1` to `n2` for the solution `x`.
    pub fn branch_flux(&self, element: &Element, x: &[f64]) -> f64 {
        match element {
            Element::Permeance(p) => p.flux(x),
            Element::MmfSource(v) => x[self.branch_index(v.branch)],
            Element::PhiSource(f) => f.branch_flux(),
        }
    }

    /// Net flux leaving each node through its branches, indexed by node ID.
    ///
    /// Every entry, ground included, is zero at an exact solution.
    pub fn flux_balance(&self, x: &[f64]) -> Vec<f64> {
        let mut balance = vec![0.0; self.node_count()];
        for element in &self.elements {
            let [n1, n2] = element.nodes();
            let phi = self.branch_flux(element, x);
            balance[n1.0] += phi;
            balance[n2.0] -= phi;
        }
        balance
    }

    /// Magnetic potential of a named node in the solution `x`.
    pub fn node_potential(&self, x: &[f64], name: &str) -> Option<f64> {
        self.find_node(name).map(|node| node.potential(x))
    }

    fn check_unique_name(&self, name: &str) -> Result<()> {
        if self
            .elements
            .iter()
            .any(|e| e.name().eq_ignore_ascii_case(name))
        {
            return Err(EmcError::DuplicateElement {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "* {}", self.title)?;
        for element in &self.elements {
            let [n1, n2] = element.nodes();
            write!(
                f,
                "\n{} {} {} {}",
                element.name(),
                self.node_names[n1.0],
                self.node_names[n2.0],
                element.netlist_params()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::HysteresisCoefficients;
    use crate::MU0;

    fn linear_model() -> BhModel {
        let points = (1..=5).map(|i| (i as f64 * 100.0, i as f64 * 100.0 * 1000.0 * MU0)).collect();
        BhModel::from_points(points, HysteresisCoefficients::default()).unwrap()
    }

    #[test]
    fn test_node_numbering() {
        let mut circ = Circuit::new("nodes");
        assert_eq!(circ.node_count(), 1);
        assert_eq!(circ.add_node("a"), NodeId(1));
        assert_eq!(circ.add_node("b"), NodeId(2));
        assert_eq!(circ.add_node("0"), NodeId::GROUND);
        assert_eq!(circ.node_name(NodeId(2)), Some("b"));
        assert_eq!(circ.node_name(NodeId::GROUND), Some("0"));
        assert_eq!(circ.node_name(NodeId(7)), None);
        assert_eq!(circ.find_node("a"), Some(NodeId(1)));
        assert_eq!(circ.find_node("missing"), None);
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut circ = Circuit::new("idempotent");
        let first = circ.add_node("n1");
        let count = circ.node_count();
        let second = circ.add_node("n1");
        assert_eq!(first, second);
        assert_eq!(circ.node_count(), count);
    }

    #[test]
    fn test_create_node() {
        let mut circ = Circuit::new("create");
        assert_eq!(circ.create_node("n1").unwrap(), "n1");
        assert!(matches!(
            circ.create_node("n1"),
            Err(EmcError::DuplicateNode { .. })
        ));
        // Ground is always accepted
        assert_eq!(circ.create_node("0").unwrap(), "0");
        assert_eq!(circ.create_node("0").unwrap(), "0");
        assert_eq!(circ.node_count(), 2);
    }

    #[test]
    fn test_permeance_geometry_validation() {
        let mut circ = Circuit::new("geometry");
        let err = circ
            .add_permeance("Rc", "n1", "n2", 3000.0, 10.0, 0.0, 120.0, None)
            .unwrap_err();
        assert!(matches!(err, EmcError::InvalidParameter { ref param, .. } if param == "depth"));
        assert!(circ
            .add_permeance("Rc", "n1", "n2", 3000.0, 0.0, 10.0, 120.0, None)
            .is_err());
        assert!(circ
            .add_permeance("Rc", "n1", "n2", 3000.0, 10.0, 10.0, 0.0, None)
            .is_err());
        // Nothing was registered by the failed calls
        assert_eq!(circ.node_count(), 1);
        assert!(circ.elements().is_empty());
    }

    #[test]
    fn test_unknown_model_reference() {
        let mut circ = Circuit::new("models");
        let err = circ
            .add_permeance("Rc", "n1", "0", 3000.0, 10.0, 10.0, 120.0, Some("35PN210"))
            .unwrap_err();
        assert!(matches!(err, EmcError::UndefinedModel { .. }));

        circ.add_material("35PN210", linear_model());
        circ.add_permeance("Rc", "n1", "0", 3000.0, 10.0, 10.0, 120.0, Some("35PN210"))
            .unwrap();
        assert!(circ.get_element("Rc").unwrap().is_nonlinear());
    }

    #[test]
    fn test_add_model_errors() {
        let mut circ = Circuit::new("models");
        assert!(matches!(
            circ.add_model("EKV", "m1", ModelParams::new("unused.tab")),
            Err(EmcError::UnknownModelKind { .. })
        ));
        assert!(matches!(
            circ.add_model("BH", "m1", ModelParams::new("/nonexistent/m1.tab")),
            Err(EmcError::FileReadError { .. })
        ));

        assert!(circ.add_material("m1", linear_model()).is_none());
        assert!(circ.add_material("m1", linear_model()).is_some());
        assert!(circ.remove_model("m1").is_some());
        assert!(circ.remove_model("m1").is_none());
    }

    #[test]
    fn test_add_model_replaces_label() {
        let path = std::env::temp_dir().join(format!("emc_graph_{}.tab", std::process::id()));
        std::fs::write(&path, "0\t0\n100\t0.5\n200\t0.9\n").unwrap();

        let mut circ = Circuit::new("models");
        circ.add_model("BH", "m", ModelParams::new(path.clone())).unwrap();
        let second = ModelParams::new(path.clone()).with_coefficients(0.02, 5e-5);
        let result = circ.add_model("BH", "m", second);
        std::fs::remove_file(&path).unwrap();

        assert!(result.is_ok());
        let model = circ.model("m").unwrap();
        assert_eq!(model.coefficients().kh, 0.02);
        assert_eq!(model.coefficients().ke, 5e-5);
    }

    #[test]
    fn test_add_model_from_file() {
        let path = std::env::temp_dir().join(format!("emc_graph_{}.tab", std::process::id()));
        std::fs::write(&path, "0\t0\n100\t0.4\n200\t0.7\n400\t1.0\n").unwrap();

        let mut circ = Circuit::new("file");
        let result = circ.add_model("BH", "core", ModelParams::new(path.clone()).with_coefficients(0.1, 0.0));
        std::fs::remove_file(&path).unwrap();
        result.unwrap();

        let model = circ.model("core").unwrap();
        assert_eq!(model.coefficients().kh, 0.1);
    }

    #[test]
    fn test_counts_and_branch_order() {
        let mut circ = Circuit::new("counts");
        circ.add_mmf_source("MMF1", "a", "0", 1.0).unwrap();
        circ.add_permeance("R1", "a", "b", 1.0, 1.0, 1.0, 1.0, None).unwrap();
        circ.add_phi_source("F1", "b", "0", 1.0).unwrap();
        circ.add_mmf_source("MMF2", "b", "c", 2.0).unwrap();

        assert_eq!(circ.node_count(), 4);
        assert_eq!(circ.mmf_count(), 2);
        assert_eq!(circ.matrix_size(), 3 + 2);

        let index_of = |name: &str| match circ.get_element(name).unwrap() {
            Element::MmfSource(v) => circ.branch_index(v.branch),
            _ => unreachable!(),
        };
        // Branch fluxes follow the potentials, in element order
        assert_eq!(index_of("MMF1"), 3);
        assert_eq!(index_of("MMF2"), 4);
        assert_eq!(circ.node_index(NodeId::GROUND), None);
        assert_eq!(circ.node_index(NodeId(3)), Some(2));
    }

    #[test]
    fn test_element_lookup() {
        let mut circ = Circuit::new("lookup");
        circ.add_permeance("Rg", "n2", "0", 1.0, 10.0, 10.0, 1.0, None).unwrap();
        assert_eq!(circ.get_element("rg").unwrap().name(), "Rg");
        assert!(matches!(
            circ.get_element("Rc"),
            Err(EmcError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_element_rejected() {
        let mut circ = Circuit::new("dups");
        circ.add_mmf_source("MMF1", "n1", "0", 1.0).unwrap();
        assert!(matches!(
            circ.add_phi_source("mmf1", "n1", "0", 1.0),
            Err(EmcError::DuplicateElement { .. })
        ));
        assert!(!circ.has_duplicate_elements());
        assert_eq!(circ.first_duplicate_element(), None);
        assert_eq!(circ.mmf_count(), 1);
    }

    #[test]
    fn test_flux_balance_of_series_loop() {
        let mut circ = Circuit::new("balance");
        circ.add_mmf_source("MMF1", "a", "0", 2.0).unwrap();
        circ.add_permeance("R1", "a", "0", 1.0, 1.0, 1.0, 1.0, None).unwrap();

        let p = circ.get_element("R1").unwrap().as_permeance().unwrap().permeance();
        // U[a] = 2, source branch carries the flux back out of ground into a
        let x = [2.0, -2.0 * p];
        for residual in circ.flux_balance(&x) {
            assert!(residual.abs() < 1e-18);
        }
        assert_eq!(circ.node_potential(&x, "a"), Some(2.0));
        assert_eq!(circ.node_potential(&x, "0"), Some(0.0));
    }

    #[test]
    fn test_display() {
        let mut circ = Circuit::new("EMC");
        circ.add_material("35PN210", linear_model());
        circ.add_mmf_source("MMF1", "n1", "0", 10000.0).unwrap();
        circ.add_permeance("Rc", "n1", "n2", 3000.0, 10.0, 10.0, 120.0, Some("35PN210"))
            .unwrap();
        circ.add_phi_source("F1", "n2", "0", 0.5).unwrap();

        let text = circ.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "* EMC");
        assert_eq!(lines[1], "MMF1 n1 0 type=MMF value=10000");
        assert_eq!(lines[2], "Rc n1 n2 mur=3000 w=10 d=10 l=120 model=35PN210");
        assert_eq!(lines[3], "F1 n2 0 type=phi value=0.5");
    }
}
