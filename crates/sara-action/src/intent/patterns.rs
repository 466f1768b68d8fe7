//! Ordered regex rule table for intent classification.
//!
//! Rules are evaluated in declaration order and the first match wins. There is
//! no scoring across intents: moving a rule changes behaviour, and the tests
//! at the bottom of this file pin the precedence that matters.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::types::IntentKind;

/// How entities are pulled out of a matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// The rule carries no entities.
    Nothing,
    /// Capture group 1 becomes the named entity.
    First(&'static str),
    /// The last capture group becomes the named entity.
    Last(&'static str),
    /// Infer an `action` entity from direction keywords in the text.
    Adjustment { allow_mute: bool },
    /// Capture group 1, when present, becomes `location`.
    Location,
}

/// A single compiled rule linked to an intent tag.
pub struct IntentPattern {
    pub regex: Regex,
    pub kind: IntentKind,
    pub extract: Extract,
    pub base_confidence: f32,
}

/// The winning rule's tag, confidence and extracted entities.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub kind: IntentKind,
    pub confidence: f32,
    pub matched_text: String,
    pub entities: BTreeMap<String, String>,
}

/// Collection of all intent rules, compiled once and reused.
pub struct PatternSet {
    patterns: Vec<IntentPattern>,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

const CONFIDENCE: f32 = 0.9;

impl PatternSet {
    /// Create a new PatternSet with every rule compiled in evaluation order.
    pub fn new() -> Self {
        use Extract::*;
        use IntentKind::*;

        let table: Vec<(IntentKind, &str, Extract, f32)> = vec![
            // =================================================================
            // Clock
            // =================================================================
            (Time, r"what.*\btime\b", Nothing, CONFIDENCE),
            (Time, r"tell.*\btime\b", Nothing, CONFIDENCE),
            (Time, r"current time", Nothing, CONFIDENCE),
            (Date, r"what.*\bdate\b", Nothing, CONFIDENCE),
            (Date, r"today.*\bdate\b", Nothing, CONFIDENCE),
            (Date, r"current date", Nothing, CONFIDENCE),
            // =================================================================
            // System control
            // =================================================================
            (
                VolumeControl,
                r"\b(increase|decrease|set|adjust)\b.*\b(volume|sound)\b",
                Adjustment { allow_mute: true },
                CONFIDENCE,
            ),
            (
                VolumeControl,
                r"\bvolume (up|down)\b",
                Adjustment { allow_mute: true },
                CONFIDENCE,
            ),
            (
                VolumeControl,
                r"\b(mute|unmute)\b",
                Adjustment { allow_mute: true },
                CONFIDENCE,
            ),
            (
                BrightnessControl,
                r"\b(increase|decrease|set)\b.*\b(brightness|screen)\b",
                Adjustment { allow_mute: false },
                CONFIDENCE,
            ),
            (
                BrightnessControl,
                r"\bbrightness (up|down)\b",
                Adjustment { allow_mute: false },
                CONFIDENCE,
            ),
            (Shutdown, r"\bshut.*down\b", Nothing, CONFIDENCE),
            (Shutdown, r"\bpower.*off\b", Nothing, CONFIDENCE),
            (Shutdown, r"\bturn.*off.*computer\b", Nothing, CONFIDENCE),
            (Restart, r"\brestart\b", Nothing, CONFIDENCE),
            (Restart, r"\breboot\b", Nothing, CONFIDENCE),
            (Lock, r"\block.*screen\b", Nothing, CONFIDENCE),
            (Lock, r"\block.*computer\b", Nothing, CONFIDENCE),
            (SystemInfo, r"\bsystem.*info", Nothing, CONFIDENCE),
            (SystemInfo, r"\bcpu.*usage\b", Nothing, CONFIDENCE),
            (SystemInfo, r"\bmemory.*usage\b", Nothing, CONFIDENCE),
            (SystemInfo, r"\bdisk.*space\b", Nothing, CONFIDENCE),
            // =================================================================
            // Applications
            // =================================================================
            (OpenApp, r"\bopen ([a-z0-9 ]+)", First("app_name"), CONFIDENCE),
            (OpenApp, r"\blaunch ([a-z0-9 ]+)", First("app_name"), CONFIDENCE),
            (OpenApp, r"\bstart ([a-z0-9 ]+)", First("app_name"), 0.85),
            (CloseApp, r"\bclose ([a-z0-9 ]+)", First("app_name"), CONFIDENCE),
            (CloseApp, r"\bquit ([a-z0-9 ]+)", First("app_name"), CONFIDENCE),
            (CloseApp, r"\bexit ([a-z0-9 ]+)", First("app_name"), 0.85),
            // =================================================================
            // Files and folders
            // =================================================================
            (
                CreateFolder,
                r"\bcreate (a |)folder.*named ([a-z0-9 ]+)",
                Last("folder_name"),
                CONFIDENCE,
            ),
            (
                CreateFolder,
                r"\bmake (a |)folder.*named ([a-z0-9 ]+)",
                Last("folder_name"),
                CONFIDENCE,
            ),
            (
                CreateFolder,
                r"\bnew folder ([a-z0-9 ]+)",
                Last("folder_name"),
                CONFIDENCE,
            ),
            (
                DeleteFolder,
                r"\bdelete.*folder ([a-z0-9 ]+)",
                Last("folder_name"),
                CONFIDENCE,
            ),
            (
                DeleteFolder,
                r"\bremove.*folder ([a-z0-9 ]+)",
                Last("folder_name"),
                CONFIDENCE,
            ),
            (
                CreateFile,
                r"\bcreate (a |)file.*named ([a-z0-9. ]+)",
                Last("file_name"),
                CONFIDENCE,
            ),
            (
                CreateFile,
                r"\bnew file ([a-z0-9. ]+)",
                Last("file_name"),
                CONFIDENCE,
            ),
            (
                DeleteFile,
                r"\bdelete.*file ([a-z0-9. ]+)",
                Last("file_name"),
                CONFIDENCE,
            ),
            (
                DeleteFile,
                r"\bremove.*file ([a-z0-9. ]+)",
                Last("file_name"),
                CONFIDENCE,
            ),
            (
                SearchFile,
                r"\bfind.*file ([a-z0-9. ]+)",
                First("file_name"),
                CONFIDENCE,
            ),
            (
                SearchFile,
                r"\bsearch.*\bfiles? (?:named |called )?([a-z0-9. ]+)",
                Last("file_name"),
                CONFIDENCE,
            ),
            (
                SearchFile,
                r"\blocate ([a-z0-9. ]+)",
                First("file_name"),
                0.85,
            ),
            // =================================================================
            // Utilities
            // =================================================================
            (SearchWeb, r"\bsearch.*\bfor (.+)", First("query"), CONFIDENCE),
            (SearchWeb, r"\bgoogle (.+)", First("query"), CONFIDENCE),
            (SearchWeb, r"\blook.*up (.+)", First("query"), 0.85),
            (Joke, r"\btell.*joke", Nothing, CONFIDENCE),
            (Joke, r"\bmake.*laugh", Nothing, CONFIDENCE),
            (Joke, r"something funny", Nothing, CONFIDENCE),
            (Weather, r"\bweather.*\bin (.+)", Location, CONFIDENCE),
            (Weather, r"what.*weather", Location, CONFIDENCE),
            (Weather, r"\btemperature\b", Location, 0.8),
        ];

        let patterns = table
            .into_iter()
            .map(|(kind, pat, extract, base_confidence)| IntentPattern {
                regex: RegexBuilder::new(pat)
                    .case_insensitive(true)
                    .build()
                    .expect("Invalid intent regex"),
                kind,
                extract,
                base_confidence,
            })
            .collect();

        Self { patterns }
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Declaration order of intent tags, with consecutive duplicates removed.
    pub fn intent_order(&self) -> Vec<IntentKind> {
        let mut order: Vec<IntentKind> = Vec::new();
        for pattern in &self.patterns {
            if order.last() != Some(&pattern.kind) {
                order.push(pattern.kind);
            }
        }
        order
    }

    /// Return the first rule that matches `text`, with its entities.
    ///
    /// Matching is case-insensitive against the trimmed input so captured
    /// entities keep the caller's casing. Keyword inference runs on a
    /// lower-cased copy.
    pub fn first_match(&self, text: &str) -> Option<PatternMatch> {
        let trimmed = text.trim();
        let normalized = trimmed.to_lowercase();

        for pattern in &self.patterns {
            let Some(caps) = pattern.regex.captures(trimmed) else {
                continue;
            };

            let mut entities = BTreeMap::new();
            match pattern.extract {
                Extract::Nothing => {}
                Extract::First(key) => {
                    insert_capture(&mut entities, key, caps.get(1).map(|m| m.as_str()));
                }
                Extract::Last(key) => {
                    let last = caps.iter().skip(1).flatten().last().map(|m| m.as_str());
                    insert_capture(&mut entities, key, last);
                }
                Extract::Adjustment { allow_mute } => {
                    if let Some(direction) = infer_adjustment(&normalized, allow_mute) {
                        entities.insert("action".to_string(), direction.to_string());
                    }
                }
                Extract::Location => {
                    insert_capture(&mut entities, "location", caps.get(1).map(|m| m.as_str()));
                }
            }

            return Some(PatternMatch {
                kind: pattern.kind,
                confidence: pattern.base_confidence,
                matched_text: caps.get(0).map_or("", |m| m.as_str()).to_string(),
                entities,
            });
        }

        None
    }
}

fn insert_capture(entities: &mut BTreeMap<String, String>, key: &str, value: Option<&str>) {
    let value = value
        .map(|v| v.trim().trim_end_matches(['?', '!', '.']).trim())
        .filter(|v| !v.is_empty());
    if let Some(value) = value {
        entities.insert(key.to_string(), value.to_string());
    }
}

/// Infer a direction keyword from lower-cased text.
///
/// `unmute` is checked before `mute` since it contains it.
fn infer_adjustment(normalized: &str, allow_mute: bool) -> Option<&'static str> {
    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |w: &str| words.contains(&w);

    if has("up") || has("increase") {
        Some("increase")
    } else if has("down") || has("decrease") {
        Some("decrease")
    } else if allow_mute && has("unmute") {
        Some("unmute")
    } else if allow_mute && has("mute") {
        Some("mute")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ps() -> PatternSet {
        PatternSet::new()
    }

    fn kind_of(text: &str) -> Option<IntentKind> {
        ps().first_match(text).map(|m| m.kind)
    }

    // =====================================================================
    // Table shape
    // =====================================================================

    #[test]
    fn test_table_declaration_order() {
        assert_eq!(
            ps().intent_order(),
            vec![
                IntentKind::Time,
                IntentKind::Date,
                IntentKind::VolumeControl,
                IntentKind::BrightnessControl,
                IntentKind::Shutdown,
                IntentKind::Restart,
                IntentKind::Lock,
                IntentKind::SystemInfo,
                IntentKind::OpenApp,
                IntentKind::CloseApp,
                IntentKind::CreateFolder,
                IntentKind::DeleteFolder,
                IntentKind::CreateFile,
                IntentKind::DeleteFile,
                IntentKind::SearchFile,
                IntentKind::SearchWeb,
                IntentKind::Joke,
                IntentKind::Weather,
            ]
        );
    }

    #[test]
    fn test_confidences_in_unit_range() {
        for pattern in &ps().patterns {
            assert!((0.0..=1.0).contains(&pattern.base_confidence));
        }
    }

    // =====================================================================
    // Clock
    // =====================================================================

    #[test]
    fn test_time_queries() {
        assert_eq!(kind_of("what time is it?"), Some(IntentKind::Time));
        assert_eq!(kind_of("Tell me the time"), Some(IntentKind::Time));
        assert_eq!(kind_of("current time please"), Some(IntentKind::Time));
    }

    #[test]
    fn test_date_queries() {
        assert_eq!(kind_of("what is the date today"), Some(IntentKind::Date));
        assert_eq!(kind_of("today's date"), Some(IntentKind::Date));
    }

    // =====================================================================
    // System control
    // =====================================================================

    #[test]
    fn test_volume_direction_inference() {
        let m = ps().first_match("increase the volume").unwrap();
        assert_eq!(m.kind, IntentKind::VolumeControl);
        assert_eq!(m.entities["action"], "increase");

        let m = ps().first_match("volume down").unwrap();
        assert_eq!(m.entities["action"], "decrease");
    }

    #[test]
    fn test_unmute_is_not_read_as_mute() {
        let m = ps().first_match("unmute").unwrap();
        assert_eq!(m.kind, IntentKind::VolumeControl);
        assert_eq!(m.entities["action"], "unmute");

        let m = ps().first_match("mute please").unwrap();
        assert_eq!(m.entities["action"], "mute");
    }

    #[test]
    fn test_volume_without_direction_has_no_action() {
        let m = ps().first_match("adjust the sound").unwrap();
        assert_eq!(m.kind, IntentKind::VolumeControl);
        assert!(!m.entities.contains_key("action"));
    }

    #[test]
    fn test_brightness_ignores_mute_keywords() {
        let m = ps().first_match("brightness up").unwrap();
        assert_eq!(m.kind, IntentKind::BrightnessControl);
        assert_eq!(m.entities["action"], "increase");
    }

    #[test]
    fn test_power_commands() {
        assert_eq!(kind_of("shutdown"), Some(IntentKind::Shutdown));
        assert_eq!(kind_of("please shut it down"), Some(IntentKind::Shutdown));
        assert_eq!(kind_of("power off"), Some(IntentKind::Shutdown));
        assert_eq!(kind_of("restart"), Some(IntentKind::Restart));
        assert_eq!(kind_of("reboot the machine"), Some(IntentKind::Restart));
        assert_eq!(kind_of("lock the screen"), Some(IntentKind::Lock));
    }

    #[test]
    fn test_restart_wins_over_start_app() {
        assert_eq!(kind_of("restart chrome"), Some(IntentKind::Restart));
    }

    #[test]
    fn test_system_info() {
        assert_eq!(kind_of("show system information"), Some(IntentKind::SystemInfo));
        assert_eq!(kind_of("what's my cpu usage"), Some(IntentKind::SystemInfo));
        assert_eq!(kind_of("how much disk space is left"), Some(IntentKind::SystemInfo));
    }

    // =====================================================================
    // Applications
    // =====================================================================

    #[test]
    fn test_open_app_captures_name() {
        let m = ps().first_match("open notepad").unwrap();
        assert_eq!(m.kind, IntentKind::OpenApp);
        assert_eq!(m.entities["app_name"], "notepad");
        assert_eq!(m.confidence, 0.9);
    }

    #[test]
    fn test_open_app_keeps_caller_casing() {
        let m = ps().first_match("  Launch Visual Studio Code ").unwrap();
        assert_eq!(m.entities["app_name"], "Visual Studio Code");
    }

    #[test]
    fn test_close_app() {
        let m = ps().first_match("close spotify").unwrap();
        assert_eq!(m.kind, IntentKind::CloseApp);
        assert_eq!(m.entities["app_name"], "spotify");
    }

    // =====================================================================
    // Files and folders
    // =====================================================================

    #[test]
    fn test_create_folder_takes_last_group() {
        let m = ps().first_match("create a folder named TestFolder").unwrap();
        assert_eq!(m.kind, IntentKind::CreateFolder);
        assert_eq!(m.entities["folder_name"], "TestFolder");

        let m = ps().first_match("create folder named Reports").unwrap();
        assert_eq!(m.entities["folder_name"], "Reports");
    }

    #[test]
    fn test_delete_folder() {
        let m = ps().first_match("delete the folder Old Stuff").unwrap();
        assert_eq!(m.kind, IntentKind::DeleteFolder);
        assert_eq!(m.entities["folder_name"], "Old Stuff");
    }

    #[test]
    fn test_create_and_delete_file() {
        let m = ps().first_match("create a file named notes.txt").unwrap();
        assert_eq!(m.kind, IntentKind::CreateFile);
        assert_eq!(m.entities["file_name"], "notes.txt");

        let m = ps().first_match("delete the file notes.txt").unwrap();
        assert_eq!(m.kind, IntentKind::DeleteFile);
        assert_eq!(m.entities["file_name"], "notes.txt");
    }

    #[test]
    fn test_search_file() {
        let m = ps().first_match("find the file report.pdf").unwrap();
        assert_eq!(m.kind, IntentKind::SearchFile);
        assert_eq!(m.entities["file_name"], "report.pdf");

        let m = ps().first_match("search for files named budget").unwrap();
        assert_eq!(m.kind, IntentKind::SearchFile);
        assert_eq!(m.entities["file_name"], "budget");
    }

    #[test]
    fn test_dotted_name_needs_file_word_to_search_disk() {
        let m = ps().first_match("search for report.pdf").unwrap();
        assert_eq!(m.kind, IntentKind::SearchWeb);
        assert_eq!(m.entities["query"], "report.pdf");

        let m = ps().first_match("search for file report.pdf").unwrap();
        assert_eq!(m.kind, IntentKind::SearchFile);
        assert_eq!(m.entities["file_name"], "report.pdf");
    }

    // =====================================================================
    // Utilities
    // =====================================================================

    #[test]
    fn test_search_web_captures_query() {
        let m = ps().first_match("search for rust borrow checker?").unwrap();
        assert_eq!(m.kind, IntentKind::SearchWeb);
        assert_eq!(m.entities["query"], "rust borrow checker");

        let m = ps().first_match("google Tokio runtime").unwrap();
        assert_eq!(m.entities["query"], "Tokio runtime");
    }

    #[test]
    fn test_joke() {
        assert_eq!(kind_of("tell me a joke"), Some(IntentKind::Joke));
        assert_eq!(kind_of("say something funny"), Some(IntentKind::Joke));
    }

    #[test]
    fn test_weather_with_and_without_location() {
        let m = ps().first_match("what's the weather in Paris?").unwrap();
        assert_eq!(m.kind, IntentKind::Weather);
        assert_eq!(m.entities["location"], "Paris");

        let m = ps().first_match("what is the weather like").unwrap();
        assert_eq!(m.kind, IntentKind::Weather);
        assert!(m.entities.is_empty());
    }

    // =====================================================================
    // No match
    // =====================================================================

    #[test]
    fn test_gibberish_has_no_match() {
        assert!(ps().first_match("xyz random gibberish abc").is_none());
    }

    #[test]
    fn test_empty_text() {
        assert!(ps().first_match("").is_none());
        assert!(ps().first_match("    ").is_none());
    }

    #[test]
    fn test_word_boundaries_prevent_substring_hits() {
        // "computer" contains neither "mute" as a word nor a volume keyword.
        assert_eq!(kind_of("my computer"), None);
        assert_eq!(kind_of("disclose everything"), None);
    }
}
