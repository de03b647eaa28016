//! Command catalog: every supported command, grouped by category.
//!
//! Definitions ([`CommandDef`]) are stable, serializable data keyed by i18n
//! keys. A [`Catalog`] turns them into [`Command`]s through a [`Localizer`];
//! switching locale rebuilds the display text while keywords, field names and
//! modes stay the same.

use std::collections::HashMap;
use std::path::Path;

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::persist::read_json;
use crate::syntax::{Field, FieldMode, Syntax};

// ── Localization seam ───────────────────────────────────────────

/// Supplies display strings. Returns `None` for unknown keys.
pub trait Localizer {
    fn text(&self, key: &str) -> Option<String>;
}

/// Localizer backed by an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MapLocalizer {
    strings: HashMap<String, String>,
}

impl MapLocalizer {
    pub fn new<K: Into<String>, V: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            strings: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// English strings for the built-in catalog.
    pub fn english() -> Self {
        Self::new([
            ("category.build", "Build"),
            ("command.build.name", "Build"),
            ("command.build.description", "Build a character and disc setup"),
            (
                "command.build.full_description",
                "Creates a build from the selected characters and discs, with counted potentials and melody skills.",
            ),
            ("param.character_id", "Character ID"),
            ("param.disc_id", "Disc ID"),
            ("param.potential_id", "Potential ID"),
            ("param.melody_id", "Melody ID"),
        ])
    }
}

impl Localizer for MapLocalizer {
    fn text(&self, key: &str) -> Option<String> {
        self.strings.get(key).cloned()
    }
}

fn localized(localizer: &dyn Localizer, key: &str) -> String {
    localizer.text(key).unwrap_or_else(|| key.to_string())
}

// ── Definitions ─────────────────────────────────────────────────

fn default_mode() -> FieldMode {
    FieldMode::Plain
}

/// One parameter of a command definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDef {
    /// Protocol key, also used as the parameter store key.
    pub name: String,
    /// i18n key for the display name. Defaults to `name`.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_mode")]
    pub mode: FieldMode,
    #[serde(default)]
    pub required: bool,
    /// Prefix for `special_prefix`, joiner for the multi-select modes.
    #[serde(default)]
    pub delimiter: Option<String>,
}

/// A command as written in a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandDef {
    /// Literal first word of the command line.
    pub keyword: String,
    /// i18n key of the category.
    pub category: String,
    /// i18n keys for the display strings.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl CommandDef {
    fn syntax(&self, localizer: &dyn Localizer) -> Result<Syntax, AppError> {
        let mut fields = vec![Field::keyword(self.keyword.clone())];
        for def in &self.fields {
            let display = localized(localizer, def.label.as_deref().unwrap_or(&def.name));
            fields.push(Field::new(
                def.name.clone(),
                display,
                def.mode,
                def.required,
                def.delimiter.clone(),
            ));
        }
        Syntax::from_fields(fields).map_err(|e| AppError::InvalidSyntax {
            command: self.keyword.clone(),
            message: e.to_string(),
        })
    }
}

/// Top-level shape of a catalog JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogFile {
    pub commands: Vec<CommandDef>,
}

// ── Commands ────────────────────────────────────────────────────

/// A localized, ready-to-use command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub full_description: String,
    pub category: String,
    pub syntax: Syntax,
}

impl Command {
    pub fn keyword(&self) -> &str {
        self.syntax.keyword()
    }
}

/// Commands in catalog order, plus the definitions they were built from.
#[derive(Debug, Clone)]
pub struct Catalog {
    defs: Vec<CommandDef>,
    commands: Vec<Command>,
}

impl Catalog {
    /// Validate and localize a list of definitions. Fails on an empty or
    /// duplicate field list, or on a keyword defined twice.
    pub fn from_defs(defs: Vec<CommandDef>, localizer: &dyn Localizer) -> Result<Self, AppError> {
        for (i, def) in defs.iter().enumerate() {
            if defs.iter().take(i).any(|d| d.keyword == def.keyword) {
                return Err(AppError::CatalogError {
                    message: format!("Command '{}' is defined twice", def.keyword),
                });
            }
        }
        let mut catalog = Self {
            defs,
            commands: Vec::new(),
        };
        catalog.localize(localizer)?;
        Ok(catalog)
    }

    /// The commands shipped with the client, in English.
    pub fn builtin() -> Result<Self, AppError> {
        Self::from_defs(builtin_defs(), &MapLocalizer::english())
    }

    pub fn from_json(json: &str, localizer: &dyn Localizer) -> Result<Self, AppError> {
        let file: CatalogFile = serde_json::from_str(json).map_err(|e| AppError::CatalogError {
            message: e.to_string(),
        })?;
        Self::from_defs(file.commands, localizer)
    }

    pub fn load(path: &Path, localizer: &dyn Localizer) -> Result<Self, AppError> {
        let file: CatalogFile = read_json(path)?;
        Self::from_defs(file.commands, localizer)
    }

    /// Rebuild every command's display text for a new locale.
    pub fn localize(&mut self, localizer: &dyn Localizer) -> Result<(), AppError> {
        self.commands = self
            .defs
            .iter()
            .map(|def| {
                Ok(Command {
                    name: localized(localizer, &def.name),
                    description: localized(localizer, &def.description),
                    full_description: localized(localizer, &def.full_description),
                    category: localized(localizer, &def.category),
                    syntax: def.syntax(localizer)?,
                })
            })
            .collect::<Result<_, AppError>>()?;
        Ok(())
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Category names in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for cmd in &self.commands {
            if !seen.contains(&cmd.category.as_str()) {
                seen.push(&cmd.category);
            }
        }
        seen
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Command> + 'a {
        self.commands.iter().filter(move |c| c.category == category)
    }

    /// Look up by keyword (the protocol name, not the localized one).
    pub fn find(&self, keyword: &str) -> Result<&Command, AppError> {
        self.commands
            .iter()
            .find(|c| c.keyword() == keyword)
            .ok_or_else(|| AppError::NotFound {
                what: format!("Command '{keyword}'"),
            })
    }

    /// Help text: one line per command grouped by category, or the full
    /// description and usage of a single command.
    pub fn help_text(&self, topic: Option<&str>) -> String {
        if let Some(cmd) = topic.and_then(|t| self.find(t).ok()) {
            let mut lines = vec![
                format!("{}: {}", cmd.name, cmd.description),
                format!("Usage: {}", cmd.syntax.usage()),
            ];
            if !cmd.full_description.is_empty() {
                lines.push(String::new());
                lines.push(cmd.full_description.clone());
            }
            lines.push(String::new());
            lines.push("Parameters:".to_string());
            for field in cmd.syntax.parameters() {
                lines.push(format!(
                    "  {} ({}) — {:?}",
                    field.original_name(),
                    field.label(),
                    field.mode()
                ));
            }
            return lines.join("\n");
        }

        let mut lines = Vec::new();
        for category in self.categories() {
            lines.push(format!("{category}:"));
            for cmd in self.in_category(category) {
                lines.push(format!("  {} — {}", cmd.keyword(), cmd.description));
            }
        }
        lines.join("\n")
    }
}

/// JSON schema of the catalog file format.
pub fn catalog_schema() -> Value {
    serde_json::to_value(schema_for!(CatalogFile))
        .unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
}

fn builtin_defs() -> Vec<CommandDef> {
    let multi = |name: &str, label: &str, mode: FieldMode| FieldDef {
        name: name.to_string(),
        label: Some(label.to_string()),
        mode,
        required: false,
        delimiter: Some(" ".to_string()),
    };
    vec![CommandDef {
        keyword: "build".to_string(),
        category: "category.build".to_string(),
        name: "command.build.name".to_string(),
        description: "command.build.description".to_string(),
        full_description: "command.build.full_description".to_string(),
        fields: vec![
            multi("characters", "param.character_id", FieldMode::MultiSelectSet),
            multi("discs", "param.disc_id", FieldMode::MultiSelectSet),
            multi("potentials", "param.potential_id", FieldMode::MultiSelectMultiset),
            multi("subNoteSkills", "param.melody_id", FieldMode::MultiSelectMultiset),
        ],
    }]
}
