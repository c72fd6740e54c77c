//! Criteria tree as supplied by callers.
//!
//! Plain data, decoded from the camelCase JSON shape produced by the search
//! front end. Content items carry no explicit tag; they are classified by the
//! keys they contain (see [`ContentItem`]).

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::schema::{EntityClass, FieldType};

/// How sibling criteria of one entity node are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Junction {
    #[default]
    And,
    Or,
}

impl Junction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl From<Option<String>> for Junction {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("OR") => Self::Or,
            _ => Self::And,
        }
    }
}

/// One level of the criteria tree: one row source table and one value of
/// its `type` discriminator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityNode {
    #[serde(default, alias = "classTemplate")]
    pub model: Option<EntityClass>,
    #[serde(alias = "pivotDataType")]
    pub data_type: JsonValue,
    #[serde(default)]
    pub junction: Junction,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    /// Projection flag, only honoured on the root node.
    #[serde(default)]
    pub wants_subject: bool,
    /// Projection flag, only honoured on the root node.
    #[serde(default)]
    pub wants_personal_info: bool,
}

impl EntityNode {
    pub fn new(model: EntityClass, data_type: impl Into<JsonValue>) -> Self {
        Self {
            model: Some(model),
            data_type: data_type.into(),
            junction: Junction::And,
            content: Vec::new(),
            wants_subject: false,
            wants_personal_info: false,
        }
    }

    pub fn from_value(value: JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Class of this node; nodes without a model are generic data.
    pub fn entity_class(&self) -> EntityClass {
        self.model.unwrap_or_default()
    }

    pub fn with_junction(mut self, junction: Junction) -> Self {
        self.junction = junction;
        self
    }

    pub fn with_item(mut self, item: impl Into<ContentItem>) -> Self {
        self.content.push(item.into());
        self
    }
}

/// One member of an entity node's `content`.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Entity(EntityNode),
    PersonalDetails(PersonalDetailsCriterion),
    Specialized(SpecializedCriterion),
    Criterion(Criterion),
}

impl ContentItem {
    fn from_object(value: JsonValue) -> serde_json::Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(de::Error::custom("content items must be JSON objects"));
        };
        if obj.contains_key("dataType") || obj.contains_key("pivotDataType") {
            Ok(Self::Entity(serde_json::from_value(value)?))
        } else if obj.contains_key("personalDetails") {
            Ok(Self::PersonalDetails(serde_json::from_value(value)?))
        } else if obj.contains_key("specializedQuery") {
            Ok(Self::Specialized(serde_json::from_value(value)?))
        } else {
            Ok(Self::Criterion(serde_json::from_value(value)?))
        }
    }
}

impl<'de> Deserialize<'de> for ContentItem {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_object(value).map_err(de::Error::custom)
    }
}

impl From<EntityNode> for ContentItem {
    fn from(value: EntityNode) -> Self {
        Self::Entity(value)
    }
}

impl From<Criterion> for ContentItem {
    fn from(value: Criterion) -> Self {
        Self::Criterion(value)
    }
}

impl From<SpecializedCriterion> for ContentItem {
    fn from(value: SpecializedCriterion) -> Self {
        Self::Specialized(value)
    }
}

impl From<PersonalDetailsCriterion> for ContentItem {
    fn from(value: PersonalDetailsCriterion) -> Self {
        Self::PersonalDetails(value)
    }
}

/// A constraint on one metadata attribute.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub comparator: Option<String>,
    #[serde(default)]
    pub field_value: Option<JsonValue>,
    #[serde(default)]
    pub field_unit: Option<String>,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default)]
    pub is_in_loop: bool,
    #[serde(default)]
    pub loop_name: Option<String>,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl Criterion {
    pub fn new(
        field_name: impl Into<String>,
        field_type: FieldType,
        comparator: impl Into<String>,
        field_value: impl Into<JsonValue>,
    ) -> Self {
        Self {
            field_name: Some(field_name.into()),
            field_type,
            comparator: Some(comparator.into()),
            field_value: Some(field_value.into()),
            ..Self::default()
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.field_unit = Some(unit.into());
        self
    }

    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    pub fn in_loop(mut self, loop_name: impl Into<String>) -> Self {
        self.is_in_loop = true;
        self.loop_name = Some(loop_name.into());
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// An empty criterion carries nothing to compile and is skipped.
    pub fn is_empty(&self) -> bool {
        self.field_name.is_none() && self.comparator.is_none() && self.field_value.is_none()
    }

    /// Unit qualifier, ignoring empty strings.
    pub fn unit(&self) -> Option<&str> {
        self.field_unit.as_deref().filter(|u| !u.is_empty())
    }
}

/// Constraints on relational columns of an entity's specialized subtype,
/// e.g. `{"specializedQuery": "Subject", "sex": ["F", "N.D."]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecializedCriterion {
    pub specialized_query: EntityClass,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

impl SpecializedCriterion {
    pub fn new(specialized_query: EntityClass) -> Self {
        Self {
            specialized_query,
            properties: Map::new(),
        }
    }

    pub fn with(mut self, property: &str, value: impl Into<JsonValue>) -> Self {
        self.properties.insert(property.to_string(), value.into());
        self
    }

    pub fn with_comparator(mut self, property: &str, comparator: &str) -> Self {
        self.properties.insert(
            format!("{}Comparator", property),
            JsonValue::String(comparator.to_string()),
        );
        self
    }
}

/// Constraints on the one-to-one `personal_details` table of a subject.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetailsCriterion {
    pub personal_details: JsonValue,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

impl Default for PersonalDetailsCriterion {
    fn default() -> Self {
        Self {
            personal_details: JsonValue::Bool(true),
            properties: Map::new(),
        }
    }
}

impl PersonalDetailsCriterion {
    pub fn with(mut self, property: &str, value: impl Into<JsonValue>) -> Self {
        self.properties.insert(property.to_string(), value.into());
        self
    }

    pub fn with_comparator(mut self, property: &str, comparator: &str) -> Self {
        self.properties.insert(
            format!("{}Comparator", property),
            JsonValue::String(comparator.to_string()),
        );
        self
    }
}

/// Property lookup shared by specialized and personal-details blocks: a
/// property counts as present only when it carries a meaningful value.
pub(crate) fn present<'a>(properties: &'a Map<String, JsonValue>, key: &str) -> Option<&'a JsonValue> {
    properties.get(key).filter(|v| match v {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Number(n) => n.as_f64() != Some(0.0),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    })
}
