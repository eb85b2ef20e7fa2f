//! Mapping profiles.
//!
//! A profile is the complete, serializable description of one reshaping
//! ruleset: where the meal blocks are, which output columns exist and how each
//! is filled, which cleanup passes run and how increments are generated.
//! Three built-in profiles track the export's header drift over time; `v3` is
//! the current one.

use std::collections::HashSet;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use super::block::BlockLayout;
use super::increment::IncrementStrategy;
use super::locator::LocatorSpec;
use super::operations::{CleanupRule, FieldSelector, Operation};
use crate::error::{ProfileError, ProfileResult};
use crate::models::BlockPart;

/// Profile used when none is requested.
pub const DEFAULT_PROFILE: &str = "v3";

/// Default `strftime` format of the timestamp column.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header label of the repeated meal-name column in the export.
pub const MEAL_NAME_LABEL: &str = "食事名";

/// Item-name columns of the five meal blocks in current exports.
pub const MEAL_NAME_INDICES: [usize; 5] = [90, 102, 114, 126, 138];

/// Highest meal slot in the booking tool's import format.
pub const MAX_SLOTS: usize = 6;

/// How one output column is filled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldRule {
    /// Copy a source column by header name; `default` when the header is absent,
    /// or `default_without_blocks` when it is absent and no meal block was found
    Source {
        column: String,
        #[serde(default)]
        default: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_without_blocks: Option<String>,
    },
    /// Always empty, filled in by hand downstream
    Blank,
    /// One field of the `slot`-th located meal block (1-based)
    Slot { slot: usize, part: BlockPart },
    /// Run timestamp
    Timestamp,
    /// Per-row increment
    Increment,
}

/// A named output column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputField {
    pub name: String,
    pub rule: FieldRule,
}

impl OutputField {
    pub fn source(name: &str, column: &str) -> Self {
        Self::source_or(name, column, "")
    }

    pub fn source_or(name: &str, column: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            rule: FieldRule::Source {
                column: column.to_string(),
                default: default.to_string(),
                default_without_blocks: None,
            },
        }
    }

    /// Like [`OutputField::source`], but `fallback` fills in when the header
    /// is absent and the row has no meal blocks.
    pub fn source_without_blocks(name: &str, column: &str, fallback: &str) -> Self {
        Self {
            name: name.to_string(),
            rule: FieldRule::Source {
                column: column.to_string(),
                default: String::new(),
                default_without_blocks: Some(fallback.to_string()),
            },
        }
    }

    pub fn blank(name: &str) -> Self {
        Self { name: name.to_string(), rule: FieldRule::Blank }
    }

    pub fn slot(name: impl Into<String>, slot: usize, part: BlockPart) -> Self {
        Self { name: name.into(), rule: FieldRule::Slot { slot, part } }
    }
}

/// A complete reshaping ruleset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// How meal blocks are found
    pub locator: LocatorSpec,

    /// Field offsets inside a meal block
    pub layout: BlockLayout,

    /// Output columns, in output order
    pub fields: Vec<OutputField>,

    /// Substitute slot names through the menu mapping table
    #[serde(default)]
    pub map_menu_names: bool,

    /// Whole-table passes run after row assembly, in order
    #[serde(default)]
    pub cleanup: Vec<CleanupRule>,

    #[serde(default)]
    pub increment: IncrementStrategy,

    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

impl Profile {
    /// Parse a profile from JSON string
    pub fn from_json(json: &str) -> ProfileResult<Self> {
        let profile: Profile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> ProfileResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve a built-in profile name or a path to a profile JSON file.
    pub fn load(name_or_path: &str) -> ProfileResult<Self> {
        if let Some(profile) = profile_by_name(name_or_path) {
            return Ok(profile);
        }

        let path = Path::new(name_or_path);
        if !path.is_file() {
            return Err(ProfileError::Unknown(name_or_path.to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ProfileError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Output header, in order.
    pub fn headers(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Source columns read by name.
    pub fn source_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match &f.rule {
                FieldRule::Source { column, .. } => Some(column.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Source columns this profile reads that `headers` lacks.
    pub fn missing_sources(&self, headers: &[String]) -> Vec<String> {
        let mut missing: Vec<String> = self
            .source_columns()
            .into_iter()
            .filter(|col| !headers.iter().any(|h| h == col))
            .map(str::to_string)
            .collect();
        missing.dedup();
        missing
    }

    /// Check the profile for internal consistency.
    pub fn validate(&self) -> ProfileResult<()> {
        let invalid = |message: String| ProfileError::Invalid {
            name: self.name.clone(),
            message,
        };

        if self.fields.is_empty() {
            return Err(invalid("no output fields".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate output field '{}'", field.name)));
            }
            if let FieldRule::Slot { slot: 0, .. } = field.rule {
                return Err(invalid(format!("field '{}' uses slot 0; slots start at 1", field.name)));
            }
        }

        if let LocatorSpec::Stride(stride) = &self.locator {
            if stride.max_blocks > 1 {
                if (stride.stride as u64) < self.layout.width() {
                    return Err(invalid(format!(
                        "stride {} is narrower than a meal block ({} columns)",
                        stride.stride,
                        self.layout.width()
                    )));
                }
                let last = (stride.max_blocks - 1)
                    .checked_mul(stride.stride)
                    .and_then(|offset| stride.base.checked_add(offset));
                if last.is_none() {
                    return Err(invalid("stride locator runs past the last column".to_string()));
                }
            }
        }

        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(invalid(format!("bad timestamp format '{}'", self.timestamp_format)));
        }

        let headers = self.headers();
        for rule in &self.cleanup {
            rule.selected_columns(&headers).map_err(|e| invalid(e.to_string()))?;
        }

        Ok(())
    }
}

// =============================================================================
// Built-in profiles
// =============================================================================

/// The booking tool's import columns.
///
/// Slot 1 is split around the guest count; slots 2-6 follow as
/// (name, remarks, quantity, price) quadruplets.
fn booking_fields(guest_count: OutputField) -> Vec<OutputField> {
    let mut fields = vec![
        OutputField::blank("ステータス"),
        OutputField::blank("注意確認"),
        OutputField::source("予約日", "予約日"),
        OutputField::blank("部屋"),
        OutputField::source("団体名（お客様名）", "団体名"),
        OutputField::source("予約時間", "到着時刻"),
        OutputField::slot("お料理名１", 1, BlockPart::Name),
        guest_count,
        OutputField::slot("単価１", 1, BlockPart::Price),
        OutputField::slot("料理備考１", 1, BlockPart::Remarks),
        OutputField::slot("料理１の数量", 1, BlockPart::Quantity),
        OutputField::blank("ご予算(メニューが未定の場合はご記入ください）"),
        OutputField::source("法人名（旅行会社名）", "業者名"),
        OutputField::source("ご要望欄(注意事項等）", "備考"),
        OutputField::source("担当者名", "業者担当者"),
        OutputField::blank("メールアドレス"),
        OutputField::source("電話番号", "業者電話番号"),
        OutputField::source("手配者名", "業者手配者"),
        OutputField::source("添乗員人数", "添乗員数"),
        OutputField::source("乗務員人数", "乗務員数"),
    ];

    for slot in 2..=MAX_SLOTS {
        fields.push(OutputField::slot(format!("お料理名{}", slot), slot, BlockPart::Name));
        fields.push(OutputField::slot(format!("料理備考{}", slot), slot, BlockPart::Remarks));
        fields.push(OutputField::slot(format!("料理{}の数量", slot), slot, BlockPart::Quantity));
        fields.push(OutputField::slot(format!("単価{}", slot), slot, BlockPart::Price));
    }

    fields.extend([
        OutputField::source("郵便番号", "業者郵便番号"),
        OutputField::source("住所", "業者住所"),
        OutputField::blank("支店名"),
        OutputField::source("FAX", "業者FAX番号"),
        OutputField::blank("メールアドレス(確認のためもう一度入力してください）"),
        OutputField { name: "タイムスタンプ".to_string(), rule: FieldRule::Timestamp },
        OutputField { name: "Increment".to_string(), rule: FieldRule::Increment },
    ]);

    fields
}

/// Header-scan extraction over `食事名` columns.
pub fn profile_v1() -> Profile {
    Profile {
        name: "v1".to_string(),
        description: "Meal blocks found by scanning for 食事名 headers".to_string(),
        locator: LocatorSpec::header_scan(MEAL_NAME_LABEL),
        layout: BlockLayout::new(1, -2, 6),
        fields: booking_fields(OutputField::source_without_blocks(
            "お客様人数",
            "食事人数",
            "0",
        )),
        map_menu_names: false,
        cleanup: Vec::new(),
        increment: IncrementStrategy::Counter,
        timestamp_format: default_timestamp_format(),
    }
}

/// Hardcoded positional meal blocks.
pub fn profile_v2() -> Profile {
    Profile {
        name: "v2".to_string(),
        description: "Meal blocks at fixed columns 90/102/114/126/138".to_string(),
        locator: LocatorSpec::fixed(MEAL_NAME_INDICES.to_vec()),
        layout: BlockLayout::new(1, -3, 7),
        fields: booking_fields(OutputField::source("お客様人数", "食事人数")),
        map_menu_names: false,
        cleanup: Vec::new(),
        increment: IncrementStrategy::Counter,
        timestamp_format: default_timestamp_format(),
    }
}

/// Positional blocks with menu substitution, remarks cleanup and dated
/// increments.
pub fn profile_v3() -> Profile {
    Profile {
        name: "v3".to_string(),
        description: "Positional meal blocks, menu name mapping, whitespace cleanup".to_string(),
        locator: LocatorSpec::stride(MEAL_NAME_INDICES[0], 12, MEAL_NAME_INDICES.len()),
        layout: BlockLayout::new(1, -3, 7),
        fields: booking_fields(OutputField::source("お客様人数", "食事人数")),
        map_menu_names: true,
        cleanup: vec![
            CleanupRule::new(
                FieldSelector::Matching { pattern: "備考".to_string() },
                Operation::StripLeading { chars: "+".to_string() },
            ),
            CleanupRule::new(FieldSelector::All, Operation::TrimEnd),
        ],
        increment: IncrementStrategy::DatePrefixed { width: 4 },
        timestamp_format: default_timestamp_format(),
    }
}

/// All built-in profiles, oldest first.
pub fn builtin_profiles() -> Vec<Profile> {
    vec![profile_v1(), profile_v2(), profile_v3()]
}

/// Look up a built-in profile.
pub fn profile_by_name(name: &str) -> Option<Profile> {
    builtin_profiles().into_iter().find(|p| p.name == name)
}
