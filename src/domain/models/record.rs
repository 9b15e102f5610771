//! Records owned by the remote backend and typed views over them.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row as the backend returns it: field name to JSON value.
pub type Record = Map<String, Value>;

/// The tables the maintenance commands know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Ingredients,
    Recipes,
    Collections,
    IngredientSubcategories,
}

impl Table {
    pub const ALL: [Self; 4] = [
        Self::Ingredients,
        Self::Recipes,
        Self::Collections,
        Self::IngredientSubcategories,
    ];

    /// Remote table name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ingredients => "ingredients",
            Self::Recipes => "recipes",
            Self::Collections => "collections",
            Self::IngredientSubcategories => "ingredient_subcategories",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingredients" => Ok(Self::Ingredients),
            "recipes" => Ok(Self::Recipes),
            "collections" => Ok(Self::Collections),
            "ingredient_subcategories" => Ok(Self::IngredientSubcategories),
            other => Err(format!("unknown table: {other}")),
        }
    }
}

impl AsRef<str> for Table {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Text stored once per locale.
///
/// Older rows hold a bare string; it is read as the English text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LocalizedTextRepr")]
pub struct LocalizedText {
    pub en: String,
    pub zh: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedTextRepr {
    Plain(String),
    Localized {
        #[serde(default)]
        en: Option<String>,
        #[serde(default)]
        zh: Option<String>,
    },
}

impl From<LocalizedTextRepr> for LocalizedText {
    fn from(repr: LocalizedTextRepr) -> Self {
        match repr {
            LocalizedTextRepr::Plain(en) => Self {
                en,
                zh: String::new(),
            },
            LocalizedTextRepr::Localized { en, zh } => Self {
                en: en.unwrap_or_default(),
                zh: zh.unwrap_or_default(),
            },
        }
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.zh.is_empty() {
            write!(f, "{}", self.en)
        } else {
            write!(f, "{} ({})", self.en, self.zh)
        }
    }
}

/// Ingredient row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name_en: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name_zh: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Columns this view does not model, kept so the row can be written back.
    #[serde(flatten)]
    pub extra: Record,
}

/// `base_spirit` is stored either as a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BaseSpirit {
    One(String),
    Many(Vec<String>),
}

impl BaseSpirit {
    /// All spirits as a list.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }

    /// Whether any listed spirit contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        match self {
            Self::One(s) => s.contains(needle),
            Self::Many(v) => v.iter().any(|s| s.contains(needle)),
        }
    }
}

impl fmt::Display for BaseSpirit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(s) => f.write_str(s),
            Self::Many(v) => f.write_str(&v.join(", ")),
        }
    }
}

/// One line of a recipe's ingredient list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
}

/// Recipe ingredient lists per locale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedIngredients {
    #[serde(default, deserialize_with = "null_as_default")]
    pub en: Vec<IngredientLine>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zh: Vec<IngredientLine>,
}

/// Recipe row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_spirit: Option<BaseSpirit>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: LocalizedIngredients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurhash: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

/// Collection row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipe_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurhash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurhash_en: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

/// Ingredient subcategory row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: String,
    #[serde(flatten)]
    pub extra: Record,
}

/// Read a typed view from a raw row.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(record))
}

/// Read typed views from raw rows, failing on the first bad row.
pub fn from_records<T: DeserializeOwned>(
    records: Vec<Record>,
) -> Result<Vec<T>, serde_json::Error> {
    records.into_iter().map(from_record).collect()
}

/// Flatten a typed view back into a raw row.
pub fn to_record<T: Serialize>(view: &T) -> Result<Record, serde_json::Error> {
    match serde_json::to_value(view)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
