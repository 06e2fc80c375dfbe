//! Barcode worklist controller.
//!
//! Scans move through `validating -> searching -> validatingFoundItem` before
//! the found item is appended. Each stage is an async collaborator call run on
//! a spawned task; its outcome comes back over a channel and is fed to the
//! state chart by the controller alone. Callers only ever send the five user
//! events. The transition functions are pure, so the whole chart can be
//! exercised without a runtime.

use crate::core::validators::{AcceptAll, RequiredBarcodeValidator};
use crate::domain::model::WorklistItem;
use crate::domain::ports::{
    BarcodeValidator, BusinessRuleCheck, ItemLookup, LocationLookup, WorklistListener,
};
use crate::utils::error::{LookupError, ScanError};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const RUNTIME_UNAVAILABLE: &str = "Scanner is not running";
const STAGE_CRASHED: &str = "Scanner stopped unexpectedly, please scan again";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleStatus {
    Normal,
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorklistState {
    Idle(IdleStatus),
    Locked,
    Validating,
    Searching,
    ValidatingFoundItem,
}

impl WorklistState {
    /// States waiting on a collaborator. Only that collaborator's outcome is accepted.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            WorklistState::Validating
                | WorklistState::Searching
                | WorklistState::ValidatingFoundItem
        )
    }

    pub fn is_idle(self) -> bool {
        matches!(self, WorklistState::Idle(_))
    }

    pub fn path(self) -> &'static str {
        match self {
            WorklistState::Idle(IdleStatus::Normal) => "idle.normal",
            WorklistState::Idle(IdleStatus::Error) => "idle.error",
            WorklistState::Idle(IdleStatus::Success) => "idle.success",
            WorklistState::Locked => "locked",
            WorklistState::Validating => "validating",
            WorklistState::Searching => "searching",
            WorklistState::ValidatingFoundItem => "validatingFoundItem",
        }
    }
}

impl fmt::Display for WorklistState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Operator input accepted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorklistEvent {
    UpdateCurrentBarcode(String),
    SubmitBarcode,
    RemoveLabware(String),
    Lock,
    Unlock,
}

impl WorklistEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorklistEvent::UpdateCurrentBarcode(_) => "UPDATE_CURRENT_BARCODE",
            WorklistEvent::SubmitBarcode => "SUBMIT_BARCODE",
            WorklistEvent::RemoveLabware(_) => "REMOVE_LABWARE",
            WorklistEvent::Lock => "LOCK",
            WorklistEvent::Unlock => "UNLOCK",
        }
    }
}

/// Result of an async stage. Only the controller's own tasks produce these.
#[derive(Debug, Clone)]
enum StageOutcome<I> {
    ValidationPassed,
    ValidationFailed(Vec<String>),
    Found(Vec<I>),
    LookupFailed(LookupError),
    RulesPassed,
    RulesFailed(Vec<String>),
}

impl<I> StageOutcome<I> {
    fn name(&self) -> &'static str {
        match self {
            StageOutcome::ValidationPassed => "done.validating",
            StageOutcome::ValidationFailed(_) => "error.validating",
            StageOutcome::Found(_) => "done.searching",
            StageOutcome::LookupFailed(_) => "error.searching",
            StageOutcome::RulesPassed => "done.validatingFoundItem",
            StageOutcome::RulesFailed(_) => "error.validatingFoundItem",
        }
    }
}

/// The collaborator behind a stage, used to phrase its failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validate,
    Lookup,
    Rules,
}

impl Stage {
    fn failed<I>(self, reason: &str) -> StageOutcome<I> {
        match self {
            Stage::Validate => StageOutcome::ValidationFailed(vec![reason.to_string()]),
            Stage::Lookup => StageOutcome::LookupFailed(LookupError::new(reason)),
            Stage::Rules => StageOutcome::RulesFailed(vec![reason.to_string()]),
        }
    }
}

/// Work requested by a transition, carried out by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum WorklistEffect<I> {
    Validate(String),
    FindItem(String),
    FindLocation(String),
    CheckRules { existing: Vec<I>, candidates: Vec<I> },
    Notify(Vec<I>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorklistContext<I> {
    pub current_barcode: String,
    pub items: Vec<I>,
    pub location_prefix: Option<String>,
    pub error: Option<ScanError>,
    pub success_message: Option<String>,
    /// Found items awaiting the rule check. Appended as a whole once it passes.
    candidates: Vec<I>,
}

impl<I> Default for WorklistContext<I> {
    fn default() -> Self {
        Self {
            current_barcode: String::new(),
            items: Vec::new(),
            location_prefix: None,
            error: None,
            success_message: None,
            candidates: Vec::new(),
        }
    }
}

impl<I: WorklistItem> WorklistContext<I> {
    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    /// The user-facing message, if any.
    pub fn message(&self) -> Option<String> {
        match &self.error {
            Some(error) => Some(error.to_string()),
            None => self.success_message.clone(),
        }
    }

    /// Items waiting on the rule check.
    pub fn candidates(&self) -> &[I] {
        &self.candidates
    }

    fn is_location_barcode(&self, barcode: &str) -> bool {
        self.location_prefix
            .as_deref()
            .is_some_and(|prefix| barcode.starts_with(prefix))
    }

    fn without_messages(&self) -> Self {
        Self {
            error: None,
            success_message: None,
            ..self.clone()
        }
    }

    fn with_error(&self, error: ScanError) -> Self {
        Self {
            error: Some(error),
            success_message: None,
            candidates: Vec::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition<I> {
    pub state: WorklistState,
    pub context: WorklistContext<I>,
    pub effects: Vec<WorklistEffect<I>>,
}

impl<I> Transition<I> {
    fn to(state: WorklistState, context: WorklistContext<I>) -> Self {
        Self {
            state,
            context,
            effects: Vec::new(),
        }
    }

    fn with_effect(mut self, effect: WorklistEffect<I>) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Computes the reaction to operator input. `None` means the event is not
/// accepted in `state` and nothing changes.
pub fn transition<I: WorklistItem>(
    state: WorklistState,
    context: &WorklistContext<I>,
    event: WorklistEvent,
) -> Option<Transition<I>> {
    use WorklistEvent::*;
    use WorklistState::*;

    match (state, event) {
        (Locked, Unlock) => Some(Transition::to(Idle(IdleStatus::Normal), context.clone())),
        (Locked, _) => None,

        (Idle(_), UpdateCurrentBarcode(value)) => {
            let mut next = context.without_messages();
            next.current_barcode = value.trim().to_string();
            Some(Transition::to(Idle(IdleStatus::Normal), next))
        }
        (Idle(_), SubmitBarcode) => {
            let barcode = context.current_barcode.clone();
            if context.contains(&barcode) {
                let next = context.with_error(ScanError::Duplicate(barcode));
                return Some(Transition::to(Idle(IdleStatus::Error), next));
            }
            Some(
                Transition::to(Validating, context.without_messages())
                    .with_effect(WorklistEffect::Validate(barcode)),
            )
        }
        (Idle(_), RemoveLabware(key)) => {
            if !context.contains(&key) {
                return None;
            }
            let mut next = context.without_messages();
            next.items.retain(|item| item.key() != key);
            next.success_message = Some(format!("\"{}\" removed", key));
            let items = next.items.clone();
            Some(
                Transition::to(Idle(IdleStatus::Success), next)
                    .with_effect(WorklistEffect::Notify(items)),
            )
        }
        (Idle(_), Lock) => Some(Transition::to(Locked, context.clone())),

        _ => None,
    }
}

/// Computes the reaction to a stage outcome. Outcomes that do not belong to
/// `state` are refused.
fn complete<I: WorklistItem>(
    state: WorklistState,
    context: &WorklistContext<I>,
    outcome: StageOutcome<I>,
) -> Option<Transition<I>> {
    use StageOutcome::*;
    use WorklistState::*;

    match (state, outcome) {
        (Validating, ValidationPassed) => {
            let barcode = context.current_barcode.clone();
            let effect = if context.is_location_barcode(&barcode) {
                WorklistEffect::FindLocation(barcode)
            } else {
                WorklistEffect::FindItem(barcode)
            };
            Some(Transition::to(Searching, context.clone()).with_effect(effect))
        }
        (Validating, ValidationFailed(messages)) => Some(Transition::to(
            Idle(IdleStatus::Error),
            context.with_error(ScanError::Format(messages)),
        )),

        (Searching, Found(found)) => {
            let submitted = context.current_barcode.clone();
            let mut next = context.clone();
            next.current_barcode.clear();

            let mut seen: HashSet<String> =
                context.items.iter().map(|i| i.key().to_string()).collect();
            let candidates: Vec<I> = found
                .iter()
                .filter(|item| seen.insert(item.key().to_string()))
                .cloned()
                .collect();

            if candidates.is_empty() {
                let reason = if found.is_empty() {
                    format!("No labware found in \"{}\"", submitted)
                } else {
                    format!("All labware in \"{}\" has already been scanned", submitted)
                };
                let next = next.with_error(ScanError::NotFound(LookupError::new(reason)));
                return Some(Transition::to(Idle(IdleStatus::Error), next));
            }

            next.candidates = candidates.clone();
            let existing = context.items.clone();
            Some(
                Transition::to(ValidatingFoundItem, next)
                    .with_effect(WorklistEffect::CheckRules { existing, candidates }),
            )
        }
        (Searching, LookupFailed(error)) => Some(Transition::to(
            Idle(IdleStatus::Error),
            context.with_error(ScanError::NotFound(error)),
        )),

        (ValidatingFoundItem, RulesPassed) => {
            let mut next = context.without_messages();
            let accepted = std::mem::take(&mut next.candidates);
            next.items.extend(accepted);
            let items = next.items.clone();
            Some(
                Transition::to(Idle(IdleStatus::Normal), next)
                    .with_effect(WorklistEffect::Notify(items)),
            )
        }
        (ValidatingFoundItem, RulesFailed(violations)) => Some(Transition::to(
            Idle(IdleStatus::Error),
            context.with_error(ScanError::BusinessRule(violations)),
        )),

        _ => None,
    }
}

/// Collaborators consumed by the controller.
pub struct WorklistServices<I: WorklistItem> {
    pub validator: Arc<dyn BarcodeValidator>,
    pub lookup: Arc<dyn ItemLookup<I>>,
    pub location_lookup: Option<Arc<dyn LocationLookup<I>>>,
    pub rules: Arc<dyn BusinessRuleCheck<I>>,
}

/// Stage outcome tagged with the submit that started it.
type Completion<I> = (u64, StageOutcome<I>);

/// Owns one worklist and drives [`transition`] against live collaborators.
///
/// Async stages are spawned on the current Tokio runtime.
pub struct WorklistController<I: WorklistItem> {
    state: WorklistState,
    context: WorklistContext<I>,
    services: WorklistServices<I>,
    listeners: Vec<WorklistListener<I>>,
    generation: u64,
    completion_sender: mpsc::UnboundedSender<Completion<I>>,
    completions: mpsc::UnboundedReceiver<Completion<I>>,
}

impl<I: WorklistItem> WorklistController<I> {
    pub fn new(lookup: Arc<dyn ItemLookup<I>>) -> Self {
        let (completion_sender, completions) = mpsc::unbounded_channel();
        Self {
            state: WorklistState::Idle(IdleStatus::Normal),
            context: WorklistContext::default(),
            services: WorklistServices {
                validator: Arc::new(RequiredBarcodeValidator),
                lookup,
                location_lookup: None,
                rules: Arc::new(AcceptAll),
            },
            listeners: Vec::new(),
            generation: 0,
            completion_sender,
            completions,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn BarcodeValidator>) -> Self {
        self.services.validator = validator;
        self
    }

    pub fn with_business_rules(mut self, rules: Arc<dyn BusinessRuleCheck<I>>) -> Self {
        self.services.rules = rules;
        self
    }

    /// Barcodes starting with `prefix` are resolved as locations holding many items.
    pub fn with_location_lookup(
        mut self,
        prefix: impl Into<String>,
        lookup: Arc<dyn LocationLookup<I>>,
    ) -> Self {
        self.context.location_prefix = Some(prefix.into());
        self.services.location_lookup = Some(lookup);
        self
    }

    pub fn start_locked(mut self) -> Self {
        self.state = WorklistState::Locked;
        self
    }

    /// Registers a listener called with the full worklist after every add or remove.
    pub fn on_change<F>(&mut self, listener: F)
    where
        F: Fn(&[I]) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> WorklistState {
        self.state
    }

    pub fn context(&self) -> &WorklistContext<I> {
        &self.context
    }

    pub fn items(&self) -> &[I] {
        &self.context.items
    }

    pub fn current_barcode(&self) -> &str {
        &self.context.current_barcode
    }

    pub fn error(&self) -> Option<&ScanError> {
        self.context.error.as_ref()
    }

    pub fn message(&self) -> Option<String> {
        self.context.message()
    }

    pub fn is_locked(&self) -> bool {
        self.state == WorklistState::Locked
    }

    /// Applies one operator event. Returns `false` if the current state refused it.
    pub fn dispatch(&mut self, event: WorklistEvent) -> bool {
        let name = event.name();
        let next = transition(self.state, &self.context, event);
        self.apply(name, next)
    }

    /// Waits for in-flight collaborator calls until the controller is interactive again.
    pub async fn settle(&mut self) {
        while self.state.is_busy() {
            let Some((generation, outcome)) = self.completions.recv().await else {
                break;
            };
            if generation != self.generation {
                debug!("Dropping stale {} from scan #{}", outcome.name(), generation);
                continue;
            }
            let name = outcome.name();
            let next = complete(self.state, &self.context, outcome);
            self.apply(name, next);
        }
    }

    /// Dispatches `event` and settles.
    pub async fn send(&mut self, event: WorklistEvent) -> bool {
        let handled = self.dispatch(event);
        self.settle().await;
        handled
    }

    /// Convenience for the usual scan gesture: set the input and submit it.
    pub async fn scan(&mut self, barcode: &str) {
        if self.dispatch(WorklistEvent::UpdateCurrentBarcode(barcode.to_string())) {
            self.send(WorklistEvent::SubmitBarcode).await;
        }
    }

    fn apply(&mut self, name: &str, next: Option<Transition<I>>) -> bool {
        let Some(next) = next else {
            debug!("{} ignored in {}", name, self.state);
            return false;
        };

        debug!("{}: {} -> {}", name, self.state, next.state);
        self.state = next.state;
        self.context = next.context;
        if let Some(error) = &self.context.error {
            warn!("Scan rejected: {}", error);
        }

        for effect in next.effects {
            self.run_effect(effect);
        }
        true
    }

    fn run_effect(&mut self, effect: WorklistEffect<I>) {
        match effect {
            WorklistEffect::Notify(items) => {
                info!("Worklist now holds {} item(s)", items.len());
                for listener in &self.listeners {
                    listener(&items);
                }
            }
            WorklistEffect::Validate(barcode) => {
                self.generation += 1;
                let validator = Arc::clone(&self.services.validator);
                self.spawn_stage(Stage::Validate, async move {
                    match validator.validate(&barcode).await {
                        Ok(()) => StageOutcome::ValidationPassed,
                        Err(messages) => StageOutcome::ValidationFailed(messages),
                    }
                });
            }
            WorklistEffect::FindLocation(barcode) if self.services.location_lookup.is_some() => {
                let Some(lookup) = self.services.location_lookup.clone() else {
                    return;
                };
                self.spawn_stage(Stage::Lookup, async move {
                    match lookup.find_in_location(&barcode).await {
                        Ok(items) => StageOutcome::Found(items),
                        Err(error) => StageOutcome::LookupFailed(error),
                    }
                });
            }
            WorklistEffect::FindItem(barcode) | WorklistEffect::FindLocation(barcode) => {
                let lookup = Arc::clone(&self.services.lookup);
                self.spawn_stage(Stage::Lookup, async move {
                    match lookup.find(&barcode).await {
                        Ok(item) => StageOutcome::Found(vec![item]),
                        Err(error) => StageOutcome::LookupFailed(error),
                    }
                });
            }
            WorklistEffect::CheckRules {
                existing,
                candidates,
            } => {
                let rules = Arc::clone(&self.services.rules);
                self.spawn_stage(Stage::Rules, check_candidates(rules, existing, candidates));
            }
        }
    }

    /// Runs `task` and reports its outcome for the current scan. A task that
    /// panics or cannot be started reports the stage's failure instead.
    fn spawn_stage<F>(&self, stage: Stage, task: F)
    where
        F: Future<Output = StageOutcome<I>> + Send + 'static,
    {
        let sender = self.completion_sender.clone();
        let generation = self.generation;

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No Tokio runtime active; scan cannot proceed");
                let _ = sender.send((generation, stage.failed(RUNTIME_UNAVAILABLE)));
                return;
            }
        };

        let worker = handle.spawn(task);
        handle.spawn(async move {
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("{:?} stage of scan #{} failed: {}", stage, generation, e);
                    stage.failed(STAGE_CRASHED)
                }
            };
            // The receiver only goes away with the controller.
            let _ = sender.send((generation, outcome));
        });
    }
}

/// Checks each candidate against the worklist as it would be once the
/// earlier candidates were accepted. All-or-nothing.
async fn check_candidates<I: WorklistItem>(
    rules: Arc<dyn BusinessRuleCheck<I>>,
    mut existing: Vec<I>,
    candidates: Vec<I>,
) -> StageOutcome<I> {
    let mut violations = Vec::new();

    for candidate in candidates {
        let problems = rules.check(&existing, &candidate).await;
        if problems.is_empty() {
            existing.push(candidate);
        } else {
            violations.extend(problems);
        }
    }

    if violations.is_empty() {
        StageOutcome::RulesPassed
    } else {
        StageOutcome::RulesFailed(violations)
    }
}
