//! On-disk documents for requirements, hosts, and work.
//!
//! Documents are plain serde shapes, read as JSON or TOML depending on the
//! file extension. Each one converts into its validated model type with
//! `TryFrom`, so every construction rule runs on loaded data exactly as it
//! does on trees built in code.
//!
//! ```json
//! {
//!   "kind": "host",
//!   "where": { "call": { "name": "greaterThan",
//!              "args": [ { "var": "host.n_free_mem" }, { "number": 1024 } ] } },
//!   "children": [
//!     { "kind": "socket", "count": "any", "children": [
//!       { "kind": "core", "count": { "range": { "start": 1, "end": 2 } }, "children": [
//!         { "kind": "cpu", "capacity": { "start": 50000, "end": 50000 } } ] } ] },
//!     { "kind": "ram", "capacity": { "start": 1024 } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use bigdecimal::BigDecimal;
use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::decimal;

use crate::error::{ExpressionError, ModelError, ModelResult};
use crate::expression::Expression;
use crate::kind::ResourceKind;
use crate::property::{Properties, PropertyValue, ValueType};
use crate::range::{Cardinality, CardinalityPolicy, NumberRange};
use crate::requirement::Requirement;
use crate::specification::Specification;
use crate::work::Work;

/// Requirement node as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementDoc {
    pub kind: ResourceKind,
    #[serde(default)]
    pub count: Cardinality,
    #[serde(default)]
    pub policy: CardinalityPolicy,
    #[serde(default, rename = "where")]
    pub condition: Option<ExpressionDoc>,
    #[serde(default)]
    pub capacity: Option<NumberRange>,
    #[serde(default)]
    pub children: Vec<RequirementDoc>,
}

/// Expression as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionDoc {
    Bool(bool),
    Number(#[serde(deserialize_with = "decimal::deserialize")] BigDecimal),
    String(String),
    Var(String),
    Call {
        name: String,
        #[serde(default)]
        args: Vec<ExpressionDoc>,
    },
}

/// A raw property value; its final type comes from the property name.
///
/// Numbers keep their written digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocValue {
    Bool(bool),
    Number(BigDecimal),
    Text(String),
}

impl<'de> Deserialize<'de> for DocValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocValueVisitor)
    }
}

struct DocValueVisitor;

impl<'de> Visitor<'de> for DocValueVisitor {
    type Value = DocValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, number or string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DocValue, E> {
        Ok(DocValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DocValue, E> {
        Ok(DocValue::Number(BigDecimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DocValue, E> {
        Ok(DocValue::Number(BigDecimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DocValue, E> {
        if !v.is_finite() {
            return Err(E::invalid_value(de::Unexpected::Float(v), &self));
        }
        decimal::parse(&v.to_string()).map(DocValue::Number)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DocValue, E> {
        Ok(DocValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DocValue, E> {
        Ok(DocValue::Text(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<DocValue, A::Error> {
        decimal::visit_json_number(map).map(DocValue::Number)
    }
}

/// Name → raw value map, used for work tags and specification properties.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PropertiesDoc(pub BTreeMap<String, DocValue>);

/// Specification node as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecificationDoc {
    pub kind: ResourceKind,
    #[serde(default)]
    pub properties: PropertiesDoc,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub capacity: Option<BigDecimal>,
    #[serde(default)]
    pub children: Vec<SpecificationDoc>,
}

/// A host inventory: the candidates for a search.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostsDoc {
    pub hosts: Vec<SpecificationDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkDoc {
    pub id: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub priority: BigDecimal,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub tags: PropertiesDoc,
    pub requirement: RequirementDoc,
}

impl TryFrom<ExpressionDoc> for Expression {
    type Error = ExpressionError;

    fn try_from(doc: ExpressionDoc) -> Result<Self, ExpressionError> {
        match doc {
            ExpressionDoc::Bool(b) => Ok(Expression::literal(b)),
            ExpressionDoc::Number(n) => Ok(Expression::literal(n)),
            ExpressionDoc::String(s) => Ok(Expression::literal(s)),
            ExpressionDoc::Var(name) => Expression::variable(&name),
            ExpressionDoc::Call { name, args } => {
                let args = args
                    .into_iter()
                    .map(Expression::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Expression::call(&name, args)
            }
        }
    }
}

impl TryFrom<RequirementDoc> for Requirement {
    type Error = ModelError;

    fn try_from(doc: RequirementDoc) -> ModelResult<Self> {
        let mut builder = Requirement::builder(doc.kind)
            .count(doc.count)
            .policy(doc.policy);
        if let Some(condition) = doc.condition {
            builder = builder.condition(Expression::try_from(condition)?);
        }
        if let Some(capacity) = doc.capacity {
            builder = builder.capacity(capacity);
        }
        let children = doc
            .children
            .into_iter()
            .map(Requirement::try_from)
            .collect::<ModelResult<Vec<_>>>()?;
        builder.children(children).build()
    }
}

impl TryFrom<PropertiesDoc> for Properties {
    type Error = ModelError;

    fn try_from(doc: PropertiesDoc) -> ModelResult<Self> {
        let mut properties = Properties::new();
        for (name, raw) in doc.0 {
            let value = convert_value(&name, raw)?;
            properties.insert(&name, value)?;
        }
        Ok(properties)
    }
}

fn convert_value(name: &str, raw: DocValue) -> ModelResult<PropertyValue> {
    let expected = ValueType::of_name(name)?;
    let mismatch = |actual: ValueType| ModelError::PropertyType {
        name: name.to_string(),
        expected,
        actual,
    };
    match (expected, raw) {
        (ValueType::Boolean, DocValue::Bool(b)) => Ok(PropertyValue::from(b)),
        (ValueType::Number, DocValue::Number(n)) => Ok(PropertyValue::number(n)),
        (ValueType::Number, DocValue::Text(s)) => parse_decimal(name, &s),
        (ValueType::String, DocValue::Text(s)) => Ok(PropertyValue::from(s)),
        (_, DocValue::Bool(_)) => Err(mismatch(ValueType::Boolean)),
        (_, DocValue::Number(_)) => Err(mismatch(ValueType::Number)),
        (_, DocValue::Text(_)) => Err(mismatch(ValueType::String)),
    }
}

fn parse_decimal(name: &str, text: &str) -> ModelResult<PropertyValue> {
    text.parse::<BigDecimal>()
        .map(PropertyValue::number)
        .map_err(|e| ModelError::DocumentParse(format!("`{name}`: {text:?} is not a decimal: {e}")))
}

impl TryFrom<SpecificationDoc> for Specification {
    type Error = ModelError;

    fn try_from(doc: SpecificationDoc) -> ModelResult<Self> {
        let properties = Properties::try_from(doc.properties)?;
        let children = doc
            .children
            .into_iter()
            .map(Specification::try_from)
            .collect::<ModelResult<Vec<_>>>()?;
        Specification::new(doc.kind, properties, doc.capacity, children)
    }
}

impl HostsDoc {
    /// Validate every listed host.
    pub fn into_hosts(self) -> ModelResult<Vec<Specification>> {
        self.hosts
            .into_iter()
            .map(|host| {
                if host.kind != ResourceKind::Host {
                    return Err(ModelError::InvalidSpecification {
                        kind: host.kind,
                        reason: "host inventory may only list hosts".into(),
                    });
                }
                Specification::try_from(host)
            })
            .collect()
    }
}

impl TryFrom<WorkDoc> for Work {
    type Error = ModelError;

    fn try_from(doc: WorkDoc) -> ModelResult<Self> {
        Work::new(
            doc.id,
            doc.priority,
            doc.parents,
            Properties::try_from(doc.tags)?,
            Requirement::try_from(doc.requirement)?,
        )
    }
}

/// Read a document, as TOML for `.toml` files and JSON otherwise.
pub fn load<T: DeserializeOwned>(path: &Path) -> ModelResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ModelError::DocumentRead(format!("{}: {e}", path.display())))?;
    let parsed = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
        _ => serde_json::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| ModelError::DocumentParse(format!("{}: {e}", path.display())))
}

pub fn load_requirement(path: &Path) -> ModelResult<Requirement> {
    Requirement::try_from(load::<RequirementDoc>(path)?)
}

pub fn load_specification(path: &Path) -> ModelResult<Specification> {
    Specification::try_from(load::<SpecificationDoc>(path)?)
}

pub fn load_hosts(path: &Path) -> ModelResult<Vec<Specification>> {
    load::<HostsDoc>(path)?.into_hosts()
}

pub fn load_work(path: &Path) -> ModelResult<Work> {
    Work::try_from(load::<WorkDoc>(path)?)
}

pub fn load_properties(path: &Path) -> ModelResult<Properties> {
    Properties::try_from(load::<PropertiesDoc>(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const HOST_JSON: &str = r#"{
        "kind": "host",
        "properties": { "s_host": "db1", "n_port": 22, "n_free_mem": "2048.0" },
        "children": [
            { "kind": "socket", "properties": { "n_socket_id": 0 }, "children": [
                { "kind": "core", "properties": { "n_core_id": 0 }, "children": [
                    { "kind": "cpu", "properties": { "n_cpu_id": 0 }, "capacity": 100000 },
                    { "kind": "cpu", "properties": { "n_cpu_id": 1 }, "capacity": 100000 }
                ] }
            ] },
            { "kind": "ram", "properties": { "n_ram_id": 0 }, "capacity": 4096 }
        ]
    }"#;

    #[test]
    fn loads_json_specification() {
        let file = write_file(".json", HOST_JSON);
        let host = load_specification(file.path()).unwrap();
        assert_eq!(host.kind(), ResourceKind::Host);
        assert_eq!(
            host.properties().get("n_free_mem"),
            Some(&PropertyValue::from(2048))
        );
        assert_eq!(host.descendants().len(), 6);
    }

    #[test]
    fn json_numbers_load_exactly() {
        let file = write_file(
            ".json",
            r#"{
                "kind": "host",
                "properties": {
                    "s_host": "db1", "n_port": 22,
                    "n_mem": 123456789012345678901,
                    "n_frac": 1234567890.123456789
                },
                "children": [
                    { "kind": "ram", "properties": { "n_ram_id": 0 }, "capacity": 0.1 }
                ]
            }"#,
        );
        let host = load_specification(file.path()).unwrap();
        let exact = |text: &str| text.parse::<BigDecimal>().unwrap();
        assert_eq!(host.children()[0].capacity(), Some(&exact("0.1")));
        assert_eq!(
            host.properties().get("n_mem"),
            Some(&PropertyValue::number(exact("123456789012345678901")))
        );
        assert_eq!(
            host.properties().get("n_frac"),
            Some(&PropertyValue::number(exact("1234567890.123456789")))
        );
    }

    #[test]
    fn fractional_capacity_range_loads_exactly() {
        let file = write_file(
            ".json",
            r#"{ "kind": "host", "children": [
                { "kind": "ram", "capacity": { "start": 0.1, "end": 0.3 } } ] }"#,
        );
        let req = load_requirement(file.path()).unwrap();
        let capacity = req.children()[0].capacity().unwrap();
        assert_eq!(capacity.start(), &"0.1".parse::<BigDecimal>().unwrap());
        assert_eq!(capacity.end(), Some(&"0.3".parse::<BigDecimal>().unwrap()));
    }

    #[test]
    fn loads_toml_requirement() {
        let file = write_file(
            ".toml",
            r#"
kind = "host"

[where.call]
name = "greaterThan"
args = [{ var = "host.n_free_mem" }, { number = 1024 }]

[[children]]
kind = "socket"
count = "any"

[[children.children]]
kind = "core"
count = { range = { start = 1, end = 2 } }
policy = "total"

[[children.children.children]]
kind = "cpu"
capacity = { start = 50000, end = 50000 }

[[children]]
kind = "ram"
capacity = { start = 1024 }
"#,
        );
        let req = load_requirement(file.path()).unwrap();
        assert_eq!(req.children().len(), 2);
        let socket = &req.children()[0];
        assert_eq!(socket.count(), &Cardinality::Any);
        let core = &socket.children()[0];
        assert_eq!(core.policy(), CardinalityPolicy::Total);
        assert_eq!(core.count(), &Cardinality::Range(NumberRange::of(1, 2).unwrap()));
        assert!(req.children()[1].capacity().unwrap().is_unbounded());
        assert_eq!(
            req.condition().to_string(),
            "greaterThan(host.n_free_mem, 1024)"
        );
    }

    #[test]
    fn loads_work_with_tags() {
        let file = write_file(
            ".json",
            r#"{
                "id": "train_1",
                "priority": "0.5",
                "parents": ["prep_1"],
                "tags": { "s_gpu_vendor": "nvidia", "b_preemptible": true },
                "requirement": { "kind": "host" }
            }"#,
        );
        let work = load_work(file.path()).unwrap();
        assert_eq!(work.id(), "train_1");
        assert_eq!(work.tags().get("b_preemptible"), Some(&PropertyValue::from(true)));
    }

    #[test]
    fn rejects_unknown_function_in_document() {
        let file = write_file(
            ".json",
            r#"{ "kind": "host", "where": { "call": { "name": "xor", "args": [] } } }"#,
        );
        let err = load_requirement(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Expression(ExpressionError::UnknownFunction(_))
        ));
    }

    #[test]
    fn rejects_property_of_wrong_type() {
        let file = write_file(".json", r#"{ "s_host": 5 }"#);
        assert!(matches!(
            load_properties(file.path()).unwrap_err(),
            ModelError::PropertyType { .. }
        ));
    }

    #[test]
    fn reports_missing_file_and_bad_syntax() {
        assert!(matches!(
            load_requirement(Path::new("/nonexistent/req.json")).unwrap_err(),
            ModelError::DocumentRead(_)
        ));
        let file = write_file(".json", "{ not json");
        assert!(matches!(
            load_requirement(file.path()).unwrap_err(),
            ModelError::DocumentParse(_)
        ));
    }

    #[test]
    fn inventory_lists_only_hosts() {
        let file = write_file(
            ".json",
            r#"{ "hosts": [ { "kind": "ram", "properties": { "n_ram_id": 0 }, "capacity": 1 } ] }"#,
        );
        assert!(load_hosts(file.path()).is_err());
    }
}
