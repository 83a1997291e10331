//! The canonical résumé schema.
//!
//! Every résumé, whether restructured from an uploaded file or rewritten for
//! a posting, passes through [`Resume`]. The shape is fixed; the content is
//! whatever the model extracted, and absent data stays empty.
//!
//! Decoding is lenient because the schema is filled by an LLM: `null` reads
//! as empty, numbers read as strings, and a lone object where a list is
//! expected reads as a one-element list.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Named groups of short items (`skills`, `technical_proficiencies`).
/// Insertion order is the model's order and is preserved on output.
pub type Categories = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resume {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub contact: Contact,
    #[serde(deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient::categories")]
    pub skills: Categories,
    #[serde(deserialize_with = "lenient::list")]
    pub experience: Vec<Experience>,
    #[serde(deserialize_with = "lenient::list")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "lenient::list")]
    pub open_source_contributions: Vec<Contribution>,
    #[serde(deserialize_with = "lenient::list")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "lenient::list")]
    pub certifications: Vec<Certification>,
    #[serde(deserialize_with = "lenient::categories")]
    pub technical_proficiencies: Categories,
    #[serde(deserialize_with = "lenient::list")]
    pub publications_talks: Vec<Publication>,
    #[serde(deserialize_with = "lenient::list")]
    pub volunteer_experience: Vec<Volunteer>,
    #[serde(deserialize_with = "lenient::string")]
    pub references: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(deserialize_with = "lenient::string")]
    pub linkedin: String,
    #[serde(deserialize_with = "lenient::string")]
    pub github: String,
    #[serde(deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub company: String,
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(deserialize_with = "lenient::string")]
    pub duration: String,
    #[serde(deserialize_with = "lenient::sentences")]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub company: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contribution {
    #[serde(deserialize_with = "lenient::string")]
    pub project: String,
    #[serde(deserialize_with = "lenient::string")]
    pub contribution: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "lenient::string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient::string")]
    pub institution: String,
    #[serde(deserialize_with = "lenient::string")]
    pub graduation_year: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub relevant_courses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub issued: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Publication {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub event: String,
    #[serde(deserialize_with = "lenient::string")]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volunteer {
    #[serde(deserialize_with = "lenient::string")]
    pub organization: String,
    #[serde(deserialize_with = "lenient::string")]
    pub role: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
}

impl Resume {
    /// Decode a résumé from an arbitrary JSON value.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// The canonical JSON form, with every schema key present.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// True when the model extracted nothing at all.
    pub fn is_empty(&self) -> bool {
        self == &Resume::default()
    }

    /// Flatten the résumé into plain text, in the order it is rendered.
    ///
    /// This is the text that gets embedded when scoring a tailored résumé,
    /// so it mirrors what a reader of the PDF would see.
    pub fn to_plain_text(&self) -> String {
        let mut out = TextBuilder::default();

        out.line(&self.name);
        let c = &self.contact;
        out.line(&join_nonempty(
            &[&c.email, &c.phone, &c.linkedin, &c.github, &c.location],
            " | ",
        ));
        out.line(&self.summary);

        for (category, items) in &self.skills {
            out.line(&format!("{}: {}", humanize(category), items.join(", ")));
        }

        for job in &self.experience {
            out.line(&job.title);
            out.line(&join_nonempty(&[&job.company, &job.location], " - "));
            out.line(&job.duration);
            for r in &job.responsibilities {
                out.line(r);
            }
        }

        for p in &self.projects {
            out.line(&p.name);
            out.line(&p.company);
            out.line(&p.description);
        }

        for c in &self.open_source_contributions {
            out.line(&c.project);
            out.line(&c.contribution);
        }

        for e in &self.education {
            out.line(&e.degree);
            out.line(&e.institution);
            out.line(&e.graduation_year);
            out.line(&e.relevant_courses.join(", "));
        }

        for c in &self.certifications {
            out.line(&join_nonempty(&[&c.name, &c.issued], ", "));
        }

        for (category, items) in &self.technical_proficiencies {
            out.line(&format!("{}: {}", humanize(category), items.join(", ")));
        }

        for p in &self.publications_talks {
            out.line(&join_nonempty(&[&p.title, &p.event, &p.year], ", "));
        }

        for v in &self.volunteer_experience {
            out.line(&join_nonempty(&[&v.organization, &v.role], " - "));
            out.line(&v.description);
        }

        out.line(&self.references);
        out.finish()
    }
}

/// Turn a schema key such as `cloud_platforms` into a label (`Cloud platforms`).
pub fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn join_nonempty(parts: &[&String], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

#[derive(Default)]
struct TextBuilder {
    buf: String,
}

impl TextBuilder {
    fn line(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.buf.is_empty() {
            self.buf.push('\n');
        }
        self.buf.push_str(text);
    }

    fn finish(self) -> String {
        self.buf
    }
}

mod lenient {
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Categories;

    pub fn string<'de, D>(d: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(value_to_string(&Value::deserialize(d)?))
    }

    pub fn strings<'de, D>(d: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(value_to_strings(&Value::deserialize(d)?))
    }

    /// Like [`strings`], but a lone string is one item: sentences keep their commas.
    pub fn sentences<'de, D>(d: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(d)?;
        match &value {
            Value::String(s) if !s.trim().is_empty() => Ok(vec![s.trim().to_string()]),
            other => Ok(value_to_strings(other)),
        }
    }

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        match Value::deserialize(d)? {
            Value::Null => Ok(T::default()),
            other => Ok(serde_json::from_value(other).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring malformed résumé field");
                T::default()
            })),
        }
    }

    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let items = match Value::deserialize(d)? {
            Value::Null => return Ok(Vec::new()),
            Value::Array(items) => items,
            single => vec![single],
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if item.is_null() {
                continue;
            }
            match serde_json::from_value(item) {
                Ok(decoded) => out.push(decoded),
                Err(e) => tracing::warn!(error = %e, "skipping malformed résumé entry"),
            }
        }
        Ok(out)
    }

    pub fn categories<'de, D>(d: D) -> Result<Categories, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut out = Categories::new();
        match Value::deserialize(d)? {
            Value::Null => {}
            Value::Object(map) => {
                for (key, value) in map {
                    out.insert(key, value_to_strings(&value));
                }
            }
            other => {
                let items = value_to_strings(&other);
                if !items.is_empty() {
                    out.insert("general".to_string(), items);
                }
            }
        }
        Ok(out)
    }

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(items) => items
                .iter()
                .map(value_to_string)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(map) => map
                .values()
                .map(value_to_string)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn value_to_strings(value: &Value) -> Vec<String> {
        match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .iter()
                .map(value_to_string)
                .filter(|s| !s.is_empty())
                .collect(),
            Value::String(s) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            other => {
                let s = value_to_string(other);
                if s.is_empty() {
                    Vec::new()
                } else {
                    vec![s]
                }
            }
        }
    }
}
