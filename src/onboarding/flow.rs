//! Flow definitions: the static graph of onboarding steps.
//!
//! A [`Flow`] is immutable once built. `FlowBuilder::build` checks the graph
//! before any session can use it: every `next` target must exist, every
//! step must be reachable from the initial step, every step must be able to
//! reach the terminal step, and every question step must be mapped to an
//! answer field with rules that make sense for its input kind.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

use super::calculators::ProfileInputs;
use super::persistence::RecordMapping;
use super::response::{Answers, Response};
use super::validation::{RuleKind, ValidationRule};

/// Step identifier.
pub type StepId = String;

/// Display language for prompts and validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Fr,
    En,
    /// US English; renders the English text.
    Us,
}

/// Text available in French and English.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub fr: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(fr: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            fr: fr.into(),
            en: en.into(),
        }
    }

    /// Render in `locale`, falling back to French when the translation is empty.
    pub fn render(&self, locale: Locale) -> &str {
        let text = match locale {
            Locale::Fr => &self.fr,
            Locale::En | Locale::Us => &self.en,
        };
        if text.is_empty() { &self.fr } else { text }
    }
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        Self::new(s, s)
    }
}

/// Presentational category of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Info,
    Question,
    Summary,
    Confirmation,
}

/// Input widget used by a question step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Number,
    Slider,
    Toggle,
    SingleSelect,
    MultiSelect,
}

impl InputKind {
    pub fn is_select(&self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultiSelect)
    }

    /// Whether `min`/`max` thresholds mean anything for this input.
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Text | Self::Number | Self::Slider)
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Slider => "slider",
            Self::Toggle => "toggle",
            Self::SingleSelect => "single_select",
            Self::MultiSelect => "multi_select",
        };
        write!(f, "{s}")
    }
}

/// One selectable option of a select step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOption {
    pub id: String,
    pub label: LocalizedText,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
}

impl StepOption {
    pub fn new(value: impl Into<String>, label: LocalizedText) -> Self {
        let value = value.into();
        Self {
            id: value.clone(),
            label,
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: LocalizedText) -> Self {
        self.description = Some(description);
        self
    }
}

/// Where a select step gets its options from.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    Static(Vec<StepOption>),
    /// Every sport the catalog knows, live list first.
    Sports,
    /// Positions of the sport stored under `sport_field`, looked up in the
    /// catalog each time the step is rendered.
    SportPositions { sport_field: String },
    /// Goals offered to the profile type stored under `profile_field`.
    ProfileGoals { profile_field: String },
}

/// Branch function: `(response, merged answers) -> next step id`.
///
/// Must be pure. `None` falls through to the terminal step.
pub type BranchFn = Arc<dyn Fn(&Response, &Answers) -> Option<StepId> + Send + Sync>;

/// Outgoing transition of a step.
#[derive(Clone)]
pub enum NextStep {
    /// Fall through to the flow's terminal step.
    Terminal,
    Fixed(StepId),
    /// Response-dependent transition. `targets` lists every id `resolve`
    /// may return so the graph can be checked ahead of time.
    Branch {
        targets: Vec<StepId>,
        resolve: BranchFn,
    },
}

impl fmt::Debug for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal => write!(f, "Terminal"),
            Self::Fixed(id) => f.debug_tuple("Fixed").field(id).finish(),
            Self::Branch { targets, .. } => {
                f.debug_struct("Branch").field("targets", targets).finish()
            }
        }
    }
}

/// Side effects attached to a step, applied after its answer is merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepHook {
    /// Chosen pack expands to its module list under `modules_field` and
    /// prices it, unless it is the custom sentinel.
    PackSelection { modules_field: String },
    /// Chosen modules are priced.
    CustomModuleSelection,
    /// Complementary modules are suggested from `modules_field`, opening a
    /// trial window when there is anything to suggest.
    Upsell { modules_field: String },
    /// Chosen modules drive the time estimate.
    ModuleSelection,
    /// Chosen sport is resolved in the catalog.
    SportSelection,
    /// Chosen profile type expands to its active modules under `modules_field`.
    ProfileType { modules_field: String },
}

/// A single node of the flow graph.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub id: StepId,
    pub kind: StepKind,
    pub title: LocalizedText,
    pub question: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub input: Option<InputKind>,
    pub options: Option<OptionSource>,
    pub rules: Vec<ValidationRule>,
    pub next: NextStep,
    pub hook: Option<StepHook>,
    pub tips: Vec<LocalizedText>,
    pub estimated_minutes: Option<u32>,
}

impl StepDefinition {
    fn new(id: impl Into<String>, kind: StepKind, title: LocalizedText) -> Self {
        Self {
            id: id.into(),
            kind,
            title,
            question: None,
            description: None,
            input: None,
            options: None,
            rules: Vec::new(),
            next: NextStep::Terminal,
            hook: None,
            tips: Vec::new(),
            estimated_minutes: None,
        }
    }

    pub fn info(id: impl Into<String>, title: LocalizedText) -> Self {
        Self::new(id, StepKind::Info, title)
    }

    pub fn question(id: impl Into<String>, title: LocalizedText, input: InputKind) -> Self {
        let mut step = Self::new(id, StepKind::Question, title);
        step.input = Some(input);
        step
    }

    pub fn summary(id: impl Into<String>, title: LocalizedText) -> Self {
        Self::new(id, StepKind::Summary, title)
    }

    pub fn confirmation(id: impl Into<String>, title: LocalizedText) -> Self {
        Self::new(id, StepKind::Confirmation, title)
    }

    pub fn prompt(mut self, question: LocalizedText) -> Self {
        self.question = Some(question);
        self
    }

    pub fn description(mut self, description: LocalizedText) -> Self {
        self.description = Some(description);
        self
    }

    pub fn options(mut self, options: Vec<StepOption>) -> Self {
        self.options = Some(OptionSource::Static(options));
        self
    }

    pub fn option_source(mut self, source: OptionSource) -> Self {
        self.options = Some(source);
        self
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn next_step(mut self, id: impl Into<String>) -> Self {
        self.next = NextStep::Fixed(id.into());
        self
    }

    pub fn branch<F>(mut self, targets: &[&str], resolve: F) -> Self
    where
        F: Fn(&Response, &Answers) -> Option<StepId> + Send + Sync + 'static,
    {
        self.next = NextStep::Branch {
            targets: targets.iter().map(|t| t.to_string()).collect(),
            resolve: Arc::new(resolve),
        };
        self
    }

    pub fn hook(mut self, hook: StepHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn tip(mut self, tip: LocalizedText) -> Self {
        self.tips.push(tip);
        self
    }

    pub fn minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }

    /// Every id this step may transition to.
    fn targets<'a>(&'a self, terminal: &'a str) -> Vec<&'a str> {
        match &self.next {
            NextStep::Terminal => vec![terminal],
            NextStep::Fixed(id) => vec![id.as_str()],
            NextStep::Branch { targets, .. } => targets.iter().map(String::as_str).collect(),
        }
    }
}

/// Maps answers onto calculator inputs; each flow names its fields differently.
pub type ProfileExtractor = fn(&Answers) -> ProfileInputs;

fn no_profile(_: &Answers) -> ProfileInputs {
    ProfileInputs::default()
}

/// A validated flow graph plus the tables the navigator needs.
#[derive(Debug)]
pub struct Flow {
    id: String,
    steps: Vec<StepDefinition>,
    index: HashMap<StepId, usize>,
    initial: StepId,
    terminal: StepId,
    field_keys: HashMap<StepId, String>,
    checkpoints: HashSet<StepId>,
    estimated_minutes: u32,
    profile: ProfileExtractor,
    always_estimate_calories: bool,
    record: RecordMapping,
}

impl Flow {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn initial(&self) -> &str {
        &self.initial
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, id: &str) -> Result<&StepDefinition, FlowError> {
        self.index
            .get(id)
            .map(|&i| &self.steps[i])
            .ok_or_else(|| FlowError::UnknownStep {
                flow: self.id.clone(),
                step_id: id.to_string(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn field_key(&self, step_id: &str) -> Option<&str> {
        self.field_keys.get(step_id).map(String::as_str)
    }

    pub fn is_checkpoint(&self, step_id: &str) -> bool {
        self.checkpoints.contains(step_id)
    }

    /// Default time estimate for the whole flow, in minutes.
    pub fn estimated_minutes(&self) -> u32 {
        self.estimated_minutes
    }

    pub fn profile_inputs(&self, answers: &Answers) -> ProfileInputs {
        (self.profile)(answers)
    }

    /// Whether calories are estimated from defaults before any body data
    /// has been answered.
    pub fn always_estimates_calories(&self) -> bool {
        self.always_estimate_calories
    }

    pub fn record_mapping(&self) -> &RecordMapping {
        &self.record
    }

    /// Resolve the transition out of `step` for a response already merged
    /// into `answers`.
    pub fn resolve_next(
        &self,
        step: &StepDefinition,
        response: &Response,
        answers: &Answers,
    ) -> Result<StepId, FlowError> {
        let next = match &step.next {
            NextStep::Terminal => self.terminal.clone(),
            NextStep::Fixed(id) => id.clone(),
            NextStep::Branch { targets, resolve } => match resolve(response, answers) {
                None => self.terminal.clone(),
                Some(id) if targets.contains(&id) || id == self.terminal => id,
                Some(id) => {
                    return Err(FlowError::UndeclaredBranchTarget {
                        from: step.id.clone(),
                        target: id,
                    });
                }
            },
        };
        if !self.contains(&next) {
            return Err(FlowError::DanglingTarget {
                from: step.id.clone(),
                target: next,
            });
        }
        Ok(next)
    }
}

/// Assembles and validates a [`Flow`].
pub struct FlowBuilder {
    id: String,
    initial: StepId,
    terminal: StepId,
    steps: Vec<StepDefinition>,
    field_keys: HashMap<StepId, String>,
    checkpoints: HashSet<StepId>,
    estimated_minutes: u32,
    profile: ProfileExtractor,
    always_estimate_calories: bool,
    record: RecordMapping,
}

impl FlowBuilder {
    pub fn new(id: impl Into<String>, initial: impl Into<String>, terminal: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initial: initial.into(),
            terminal: terminal.into(),
            steps: Vec::new(),
            field_keys: HashMap::new(),
            checkpoints: HashSet::new(),
            estimated_minutes: 0,
            profile: no_profile,
            always_estimate_calories: false,
            record: RecordMapping::default(),
        }
    }

    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Store answers to `step_id` under `field`.
    pub fn field(mut self, step_id: &str, field: &str) -> Self {
        self.field_keys.insert(step_id.to_string(), field.to_string());
        self
    }

    pub fn checkpoints(mut self, step_ids: &[&str]) -> Self {
        self.checkpoints
            .extend(step_ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn estimated_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    pub fn profile(mut self, extractor: ProfileExtractor) -> Self {
        self.profile = extractor;
        self
    }

    pub fn always_estimate_calories(mut self) -> Self {
        self.always_estimate_calories = true;
        self
    }

    pub fn record(mut self, mapping: RecordMapping) -> Self {
        self.record = mapping;
        self
    }

    pub fn build(self) -> Result<Flow, FlowError> {
        let mut index = HashMap::with_capacity(self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            if index.insert(step.id.clone(), i).is_some() {
                return Err(FlowError::DuplicateStep {
                    flow: self.id.clone(),
                    step_id: step.id.clone(),
                });
            }
        }

        for required in [&self.initial, &self.terminal] {
            if !index.contains_key(required) {
                return Err(FlowError::UnknownStep {
                    flow: self.id.clone(),
                    step_id: required.clone(),
                });
            }
        }

        for step in &self.steps {
            check_step(step, &self.field_keys)?;
            if step.id == self.terminal {
                continue;
            }
            for target in step.targets(&self.terminal) {
                if !index.contains_key(target) {
                    return Err(FlowError::DanglingTarget {
                        from: step.id.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        for checkpoint in &self.checkpoints {
            if !index.contains_key(checkpoint) {
                return Err(FlowError::UnknownStep {
                    flow: self.id.clone(),
                    step_id: checkpoint.clone(),
                });
            }
        }

        check_reachability(&self.steps, &self.initial, &self.terminal)?;

        Ok(Flow {
            id: self.id,
            steps: self.steps,
            index,
            initial: self.initial,
            terminal: self.terminal,
            field_keys: self.field_keys,
            checkpoints: self.checkpoints,
            estimated_minutes: self.estimated_minutes,
            profile: self.profile,
            always_estimate_calories: self.always_estimate_calories,
            record: self.record,
        })
    }
}

fn check_step(step: &StepDefinition, field_keys: &HashMap<StepId, String>) -> Result<(), FlowError> {
    if step.kind != StepKind::Question {
        return Ok(());
    }
    let input = step.input.ok_or_else(|| FlowError::MissingInputKind {
        step_id: step.id.clone(),
    })?;
    if !field_keys.contains_key(&step.id) {
        return Err(FlowError::UnmappedStep {
            step_id: step.id.clone(),
        });
    }
    if input.is_select() {
        let has_options = match &step.options {
            Some(OptionSource::Static(options)) => !options.is_empty(),
            Some(
                OptionSource::Sports
                | OptionSource::SportPositions { .. }
                | OptionSource::ProfileGoals { .. },
            ) => true,
            None => false,
        };
        if !has_options {
            return Err(FlowError::MissingOptions {
                step_id: step.id.clone(),
            });
        }
    }
    for rule in &step.rules {
        let compatible = match &rule.kind {
            RuleKind::Min(_) | RuleKind::Max(_) => input.is_bounded(),
            RuleKind::Pattern(_) => input == InputKind::Text,
            RuleKind::Required | RuleKind::Custom(_) => true,
        };
        if !compatible {
            return Err(FlowError::IncompatibleRule {
                step_id: step.id.clone(),
                rule: rule.kind.name().to_string(),
                input: input.to_string(),
            });
        }
    }
    Ok(())
}

/// Forward reachability from `initial`, then backward reachability from
/// `terminal`. A step that fails the second check sits on a cycle (or dead
/// end) with no way out.
fn check_reachability(steps: &[StepDefinition], initial: &str, terminal: &str) -> Result<(), FlowError> {
    let mut forward: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut backward: HashMap<&str, Vec<&str>> = HashMap::new();
    for step in steps {
        if step.id == terminal {
            continue;
        }
        for target in step.targets(terminal) {
            forward.entry(step.id.as_str()).or_default().push(target);
            backward.entry(target).or_default().push(step.id.as_str());
        }
    }

    let reachable = walk(&forward, initial);
    let exits = walk(&backward, terminal);

    for step in steps {
        if !reachable.contains(step.id.as_str()) {
            return Err(FlowError::Unreachable {
                step_id: step.id.clone(),
            });
        }
        if !exits.contains(step.id.as_str()) {
            return Err(FlowError::NoPathToTerminal {
                step_id: step.id.clone(),
            });
        }
    }
    Ok(())
}

fn walk<'a>(edges: &HashMap<&'a str, Vec<&'a str>>, start: &'a str) -> HashSet<&'a str> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for &next in edges.get(node).map(Vec::as_slice).unwrap_or_default() {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
