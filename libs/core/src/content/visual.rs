use serde::{Deserialize, Serialize};

use super::image::Image;
use super::progress::ProgressBar;
use super::text::Text;

/// An element in the body of the visual region, rendered in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyElement {
    Text(Text),
    Image(Image),
    Progress(ProgressBar),
    Group(Group),
}

/// Side-by-side columns inside the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub columns: Vec<Subgroup>,
}

impl Group {
    pub fn new(columns: Vec<Subgroup>) -> Self {
        Self { columns }
    }
}

/// One column of a [`Group`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    pub children: Vec<SubgroupChild>,
}

impl Subgroup {
    pub fn new(children: Vec<SubgroupChild>) -> Self {
        Self {
            weight: None,
            children,
        }
    }

    /// Relative width of this column against its siblings.
    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Elements a column may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubgroupChild {
    Text(Text),
    Image(Image),
}

impl From<Text> for SubgroupChild {
    fn from(t: Text) -> Self {
        SubgroupChild::Text(t)
    }
}

impl From<Image> for SubgroupChild {
    fn from(i: Image) -> Self {
        SubgroupChild::Image(i)
    }
}

/// The visual region of a notification: the body plus the fixed image
/// slots and region-wide attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    pub body: Vec<BodyElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero: Option<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Text>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Visual {
    /// True when the body carries at least one text line.
    pub fn has_text(&self) -> bool {
        self.body.iter().any(|el| matches!(el, BodyElement::Text(_)))
    }
}
