//! Pre-trade SOP checklist.
//!
//! Each item moves from unanswered to yes or no once per session; only a
//! reset clears it. Executing a fully answered checklist produces an audit
//! log record and a pending payload for the next journal entry.

use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ChecklistError;
use super::trade::TriState;

/// Revision of the built-in SOP content.
pub const SOP_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(rename = "checked")]
    pub state: TriState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistSection {
    pub id: &'static str,
    pub title: &'static str,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionStats {
    pub total: usize,
    pub yes: usize,
    pub no: usize,
    pub answered: usize,
    pub all_yes: bool,
    pub has_no: bool,
}

impl ChecklistSection {
    pub fn stats(&self) -> SectionStats {
        let total = self.items.len();
        let yes = self.items.iter().filter(|i| i.state == TriState::Yes).count();
        let no = self.items.iter().filter(|i| i.state == TriState::No).count();
        let answered = yes + no;
        SectionStats {
            total,
            yes,
            no,
            answered,
            all_yes: answered == total && yes == total,
            has_no: no > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "VALID")]
    Valid,
    #[serde(rename = "INVALID")]
    Invalid,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Valid => "VALID",
            Verdict::Invalid => "INVALID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Only a fully valid checklist may be executed.
    Normal,
    /// "Log anyway": any fully answered checklist may be executed.
    Override,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedItem {
    pub label: String,
    pub checked: TriState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedSection {
    pub title: String,
    pub items: Vec<LoggedItem>,
}

/// Immutable audit record of one execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistLog {
    pub id: String,
    pub date: String,
    pub timestamp: String,
    /// SOP revision the answers were given against.
    pub sop_version: u32,
    pub checklist_result: Verdict,
    pub is_rule_break: bool,
    pub failed_items: Vec<String>,
    pub sections: Vec<LoggedSection>,
}

/// Hand-off payload picked up by the next journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChecklist {
    pub is_rule_break: bool,
    #[serde(default)]
    pub failed_items: Vec<String>,
    pub checklist_result: Verdict,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Checklist {
    sections: Vec<ChecklistSection>,
}

fn section(
    id: &'static str,
    title: &'static str,
    items: &[(&'static str, &'static str)],
) -> ChecklistSection {
    ChecklistSection {
        id,
        title,
        items: items
            .iter()
            .map(|&(id, label)| ChecklistItem {
                id,
                label,
                state: TriState::Unanswered,
            })
            .collect(),
    }
}

impl Checklist {
    /// Fresh, unanswered SOP.
    pub fn sop() -> Self {
        let sections = vec![
            section(
                "trading-conditions",
                "Trading Conditions",
                &[
                    ("tc-1", "Is today a valid trading day (no bank holiday)?"),
                    ("tc-2", "Is current time within trading session (5:30 PM – 10:30 PM)?"),
                    ("tc-3", "Is there NO high-impact news near entry?"),
                ],
            ),
            section(
                "market-context",
                "Market Context",
                &[
                    ("mc-1", "1H market structure (mBOS) identified"),
                    ("mc-2", "Valid trading range identified (LSL / MIT / IDM / mChoCH)"),
                ],
            ),
            section(
                "trade-type",
                "Trade Type Identification",
                &[
                    ("tt-1", "Trade type selected (15min PT / CT / ECT)"),
                    ("tt-2", "Is trade aligned with 15min BOS?"),
                ],
            ),
            section(
                "poi-validation",
                "POI Validation",
                &[
                    ("pv-1", "Valid 15min POI identified"),
                    ("pv-2", "POI has imbalance OR refined to valid LTF POI"),
                    ("pv-3", "POI has broken structure"),
                ],
            ),
            section(
                "poi-tap",
                "POI Tap Confirmation",
                &[
                    ("pt-1", "POI tapped properly"),
                    ("pt-2", "Not just internal liquidity tap"),
                ],
            ),
            section(
                "entry-confirmation",
                "Entry Confirmation",
                &[
                    ("ec-1", "3min ChoCH confirmed"),
                    ("ec-2", "Entry model valid"),
                    ("ec-3", "Clean structure (no messy confirmation)"),
                ],
            ),
            section(
                "risk-validation",
                "Risk Validation",
                &[("rv-1", "RR ≥ 5R"), ("rv-2", "Risk per trade = 1%")],
            ),
        ];
        Self { sections }
    }

    /// Rebuild from persisted state. Answers are matched by section and item
    /// id; unknown ids are ignored and a malformed blob gives a fresh SOP.
    pub fn restore(saved: &Value) -> Self {
        let mut checklist = Self::sop();
        let Some(saved_sections) = saved.as_array() else {
            warn!("saved checklist state is not a list, starting fresh");
            return checklist;
        };

        for section in &mut checklist.sections {
            let Some(saved_section) = saved_sections
                .iter()
                .find(|s| s.get("id").and_then(Value::as_str) == Some(section.id))
            else {
                continue;
            };
            let Some(saved_items) = saved_section.get("items").and_then(Value::as_array) else {
                continue;
            };
            for item in &mut section.items {
                if let Some(saved_item) = saved_items
                    .iter()
                    .find(|i| i.get("id").and_then(Value::as_str) == Some(item.id))
                {
                    item.state = saved_item
                        .get("checked")
                        .and_then(Value::as_bool)
                        .into();
                }
            }
        }
        checklist
    }

    pub fn sections(&self) -> &[ChecklistSection] {
        &self.sections
    }

    fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn total(&self) -> usize {
        self.items().count()
    }

    pub fn answered(&self) -> usize {
        self.items().filter(|i| i.state.is_answered()).count()
    }

    pub fn all_answered(&self) -> bool {
        self.answered() == self.total()
    }

    pub fn is_valid(&self) -> bool {
        self.all_answered() && self.items().all(|i| i.state == TriState::Yes)
    }

    pub fn has_any_no(&self) -> bool {
        self.items().any(|i| i.state == TriState::No)
    }

    /// Percent of items answered.
    pub fn progress(&self) -> f64 {
        super::metrics::percentage(self.answered(), self.total())
    }

    pub fn failed_items(&self) -> Vec<String> {
        self.items()
            .filter(|i| i.state == TriState::No)
            .map(|i| i.label.to_string())
            .collect()
    }

    pub fn verdict(&self) -> Verdict {
        if self.is_valid() {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }

    /// Record a yes/no answer for one item.
    pub fn answer(&mut self, item_id: &str, yes: bool) -> Result<(), ChecklistError> {
        let item = self
            .sections
            .iter_mut()
            .flat_map(|s| s.items.iter_mut())
            .find(|i| i.id == item_id)
            .ok_or_else(|| ChecklistError::UnknownItem(item_id.to_string()))?;
        if item.state.is_answered() {
            return Err(ChecklistError::AlreadyAnswered(item_id.to_string()));
        }
        item.state = yes.into();
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::sop();
    }

    /// Execute the checklist, then reset it.
    pub fn execute(
        &mut self,
        mode: ExecutionMode,
        now: DateTime<Utc>,
    ) -> Result<(ChecklistLog, PendingChecklist), ChecklistError> {
        if !self.all_answered() {
            return Err(ChecklistError::Incomplete {
                answered: self.answered(),
                total: self.total(),
            });
        }
        if mode == ExecutionMode::Normal && !self.is_valid() {
            return Err(ChecklistError::NotValid);
        }

        let failed_items = self.failed_items();
        let is_rule_break = !failed_items.is_empty();
        let checklist_result = if is_rule_break {
            Verdict::Invalid
        } else {
            Verdict::Valid
        };
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let log = ChecklistLog {
            id: now.timestamp_millis().to_string(),
            date: now.format("%Y-%m-%d").to_string(),
            timestamp: timestamp.clone(),
            sop_version: SOP_VERSION,
            checklist_result,
            is_rule_break,
            failed_items: failed_items.clone(),
            sections: self
                .sections
                .iter()
                .map(|s| LoggedSection {
                    title: s.title.to_string(),
                    items: s
                        .items
                        .iter()
                        .map(|i| LoggedItem {
                            label: i.label.to_string(),
                            checked: i.state,
                        })
                        .collect(),
                })
                .collect(),
        };
        let pending = PendingChecklist {
            is_rule_break,
            failed_items,
            checklist_result,
            timestamp,
        };

        self.reset();
        Ok((log, pending))
    }
}

impl Default for Checklist {
    fn default() -> Self {
        Self::sop()
    }
}
