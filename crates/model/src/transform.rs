//! Service-to-service model transformation.
//!
//! Several services share internal components: a classifier trained with a
//! nearest-neighbor method embeds a complete nearest-neighbor engine, a LOF
//! anomaly detector embeds a recommender, and every generic service carries a
//! weight manager. A model of one service can therefore be turned into a
//! model of another by cutting the shared component out of the payload.
//!
//! The payload is engine-private. All that is known about it is captured in
//! two places:
//!
//! - the generic shape `[1, [algorithm_model, weight_manager_model]]` shared
//!   by every source service ([`unpack_generic`]);
//! - the [`RULES`] table naming, per (source, method, target), which element
//!   of the two-element algorithm model to keep.
//!
//! Sub-blobs are moved as raw byte ranges and never re-encoded. A payload
//! that does not have the shape the rules assume was not produced by the
//! (service, method) pair its config claims; that is a broken invariant and
//! panics rather than emitting a model the engine would misread.

use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::msgpack::{self, MsgPackError, ValueExt};
use serde_json::json;

/// Service names as stored in `system.type`.
pub mod services {
    /// Classifier service
    pub const CLASSIFIER: &str = "classifier";
    /// Regression service
    pub const REGRESSION: &str = "regression";
    /// Recommender service
    pub const RECOMMENDER: &str = "recommender";
    /// Anomaly detection service
    pub const ANOMALY: &str = "anomaly";
    /// Clustering service
    pub const CLUSTERING: &str = "clustering";
    /// Nearest neighbor service
    pub const NEAREST_NEIGHBOR: &str = "nearest_neighbor";
    /// Feature weight service
    pub const WEIGHT: &str = "weight";
}

use services::*;

/// Version of the generic `[algorithm_model, weight_manager_model]` payload.
pub const GENERIC_USER_VERSION: u64 = 1;

/// Services whose payload has the generic two-part shape. All of them can be
/// transformed into [`WEIGHT`].
pub const GENERIC_SERVICES: &[&str] = &[CLASSIFIER, REGRESSION, RECOMMENDER, ANOMALY, CLUSTERING];

/// One algorithm-specific extraction.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Source services the rule applies to
    pub sources: &'static [&'static str],
    /// Accepted values of the source config's `method`
    pub methods: &'static [&'static str],
    /// Target service
    pub target: &'static str,
    /// Names of the two elements of the algorithm model, in wire order
    pub layout: [&'static str; 2],
    /// Index of the element that becomes the target's algorithm model
    pub keep: usize,
}

/// Every supported non-weight transformation.
pub const RULES: &[Rule] = &[
    Rule {
        sources: &[CLASSIFIER, REGRESSION],
        methods: &["nearest_neighbor", "NN"],
        target: NEAREST_NEIGHBOR,
        layout: ["nearest_neighbor_engine", "labels"],
        keep: 0,
    },
    Rule {
        sources: &[RECOMMENDER],
        methods: &["nearest_neighbor_recommender"],
        target: NEAREST_NEIGHBOR,
        layout: ["orig", "nearest_neighbor_engine"],
        keep: 1,
    },
    Rule {
        sources: &[ANOMALY],
        methods: &["light_lof"],
        target: NEAREST_NEIGHBOR,
        layout: ["nearest_neighbor_engine", "mixable_scores"],
        keep: 0,
    },
    // Element order follows the engine's packing order for LOF; not yet
    // checked against a model saved by a real LOF anomaly server.
    Rule {
        sources: &[ANOMALY],
        methods: &["lof"],
        target: RECOMMENDER,
        layout: ["mixable_storage", "nearest_neighbor_engine"],
        keep: 1,
    },
];

fn find_rule(source: &str, method: &str, target: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| {
        r.target == target && r.sources.contains(&source) && r.methods.contains(&method)
    })
}

/// The two generic parts of a payload, as raw byte ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericParts<'a> {
    /// Service-specific algorithm model
    pub algorithm: &'a [u8],
    /// Weight manager model
    pub weight_manager: &'a [u8],
}

/// Split an encoded array of exactly `len` elements into the raw bytes of
/// each element.
pub fn split_array(bytes: &[u8], len: u32) -> Result<Vec<&[u8]>, MsgPackError> {
    let mut rd = bytes;
    let found = msgpack::read_array_len(&mut rd)?;
    if found != len {
        return Err(MsgPackError::ArrayLength {
            expected: len,
            found,
        });
    }
    (0..len).map(|_| msgpack::read_raw(&mut rd)).collect()
}

#[track_caller]
fn layout<T>(result: Result<T, MsgPackError>, what: &str, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("{} payload does not have the expected layout ({}): {}", context, what, e),
    }
}

/// Split a payload into its algorithm model and weight manager model.
///
/// # Panics
///
/// Panics if the payload is not `[1, [algorithm_model, weight_manager]]`.
pub fn unpack_generic<'a>(user_raw: &'a [u8], context: &str) -> GenericParts<'a> {
    let container = layout(split_array(user_raw, 2), "user container", context);
    let version = layout(msgpack::decode(container[0]), "user container version", context);
    if version.as_u64() != Some(GENERIC_USER_VERSION) {
        panic!(
            "{} payload does not have the expected layout (user container version): expected {}, found {}",
            context,
            GENERIC_USER_VERSION,
            version.to_json()
        );
    }
    let parts = layout(split_array(container[1], 2), "user data", context);
    GenericParts {
        algorithm: parts[0],
        weight_manager: parts[1],
    }
}

/// Pick the rule's element out of an algorithm model.
///
/// # Panics
///
/// Panics if the algorithm model is not a two-element array.
pub fn extract<'a>(rule: &Rule, algorithm: &'a [u8], context: &str) -> &'a [u8] {
    let what = format!("algorithm model [{}, {}]", rule.layout[0], rule.layout[1]);
    let elements = layout(split_array(algorithm, 2), &what, context);
    elements[rule.keep]
}

fn config_key<'a>(config: &'a serde_json::Value, path: &[&str]) -> ModelResult<&'a serde_json::Value> {
    path.iter()
        .try_fold(config, |node, key| node.get(*key))
        .ok_or_else(|| ModelError::InvalidConfig(format!("config has no `{}`", path.join("."))))
}

/// Config of a weight model: only the converter carries over.
fn weight_config(config: &serde_json::Value) -> ModelResult<serde_json::Value> {
    Ok(json!({
        "converter": config_key(config, &["converter"])?,
    }))
}

/// Config of a backend model: the source's nested algorithm block becomes
/// the target's top-level method and parameter.
fn backend_config(config: &serde_json::Value) -> ModelResult<serde_json::Value> {
    Ok(json!({
        "method": config_key(config, &["parameter", "method"])?,
        "parameter": config_key(config, &["parameter", "parameter"])?,
        "converter": config_key(config, &["converter"])?,
    }))
}

fn config_method(config: &serde_json::Value) -> ModelResult<&str> {
    config_key(config, &["method"])?
        .as_str()
        .ok_or_else(|| ModelError::InvalidConfig("config `method` is not a string".to_string()))
}

fn reassemble(
    source: &Model,
    target: &str,
    parts: &[&[u8]],
    config: &serde_json::Value,
) -> ModelResult<Model> {
    let user_raw = Model::encode_user_parts(GENERIC_USER_VERSION, parts)?;

    let mut system = source.system.clone();
    system.service_type = target.as_bytes().to_vec();
    system.config = serde_json::to_string(config)?.into_bytes();

    let mut model = Model::from_parts(source.header, system, user_raw)?;
    model.fix_header()?;

    tracing::info!(
        from = %source.system.service_type(),
        to = target,
        user_data_size = model.header.user_data_size,
        "transformed model"
    );
    Ok(model)
}

impl Model {
    /// Transform this model into a model of the `target` service.
    ///
    /// The returned model has a fixed header. `self` is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the payload does not have the layout implied by the
    /// model's service and method.
    pub fn transform(&self, target: &str) -> ModelResult<Model> {
        let source = self.system.service_type();
        if !GENERIC_SERVICES.contains(&source.as_str()) {
            return Err(ModelError::unsupported(source, target));
        }
        let config = self.config()?;
        let user_raw = self.user_bytes()?;

        if target == WEIGHT {
            let parts = unpack_generic(&user_raw, &source);
            return reassemble(self, target, &[parts.weight_manager], &weight_config(&config)?);
        }

        let method = config_method(&config)?;
        let rule = find_rule(&source, method, target)
            .ok_or_else(|| ModelError::unsupported(source.as_str(), target))?;
        let context = format!("{}/{}", source, method);
        let parts = unpack_generic(&user_raw, &context);
        let algorithm = extract(rule, parts.algorithm, &context);
        reassemble(
            self,
            target,
            &[algorithm, parts.weight_manager],
            &backend_config(&config)?,
        )
    }

    /// Services this model can be transformed into.
    pub fn transform_targets(&self) -> Vec<&'static str> {
        let source = self.system.service_type();
        if !GENERIC_SERVICES.contains(&source.as_str()) {
            return Vec::new();
        }
        let mut targets = vec![WEIGHT];
        if let Ok(config) = self.config() {
            if let Ok(method) = config_method(&config) {
                targets.extend(
                    RULES
                        .iter()
                        .filter(|r| r.sources.contains(&source.as_str()) && r.methods.contains(&method))
                        .map(|r| r.target),
                );
            }
        }
        targets
    }
}
