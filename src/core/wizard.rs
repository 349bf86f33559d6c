use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use super::types::{
    Experience, Goal, Profile, ProfileDraft, RiskTolerance, TimeHorizon, income_range,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
    Name,
    Age,
    Income,
    InvestmentAmount,
    TimeHorizon,
    RiskTolerance,
    Goals,
    Experience,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Name,
        Step::Age,
        Step::Income,
        Step::InvestmentAmount,
        Step::TimeHorizon,
        Step::RiskTolerance,
        Step::Goals,
        Step::Experience,
    ];

    pub fn first() -> Step {
        Step::Name
    }

    pub fn is_last(self) -> bool {
        self == Step::Experience
    }

    fn index(self) -> usize {
        Step::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or_default()
    }

    fn next(self) -> Option<Step> {
        Step::ALL.get(self.index() + 1).copied()
    }

    fn prev(self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Step::ALL[i])
    }

    pub fn field(self) -> &'static str {
        match self {
            Step::Name => "name",
            Step::Age => "age",
            Step::Income => "annual_income",
            Step::InvestmentAmount => "investment_amount",
            Step::TimeHorizon => "time_horizon",
            Step::RiskTolerance => "risk_tolerance",
            Step::Goals => "goals",
            Step::Experience => "experience",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AdvanceOutcome {
    Advanced(Step),
    Rejected(Vec<FieldError>),
    ReadyToFinalize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RetreatOutcome {
    MovedBack(Step),
    ExitWizard,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct SubmissionError {
    pub message: String,
}

#[derive(Debug, PartialEq, Error)]
pub enum FinalizeError {
    #[error("profile is incomplete")]
    Invalid(Vec<FieldError>),
    #[error("a submission is already in flight")]
    AlreadyInFlight,
    #[error("profile was already submitted")]
    AlreadyCompleted,
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

#[async_trait]
pub trait ProfileSubmitter: Send + Sync {
    async fn submit(&self, profile: &Profile) -> Result<(), SubmissionError>;
}

pub fn validate_step(step: Step, draft: &ProfileDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut reject = |message| {
        errors.push(FieldError {
            field: step.field(),
            message,
        });
    };

    match step {
        Step::Name => {
            if !draft
                .name
                .as_deref()
                .is_some_and(|n| n.trim().chars().count() >= 2)
            {
                reject("Name must be at least 2 characters.");
            }
        }
        Step::Age => {
            if !draft.age.is_some_and(|a| (18..=100).contains(&a)) {
                reject("Age must be between 18 and 100.");
            }
        }
        Step::Income => {
            if !draft
                .annual_income
                .is_some_and(|v| v.is_finite() && v >= 0.0)
            {
                reject("Annual income must be zero or more.");
            }
        }
        Step::InvestmentAmount => {
            if !draft
                .investment_amount
                .is_some_and(|v| v.is_finite() && v > 0.0)
            {
                reject("Investment amount must be a positive number.");
            }
        }
        Step::TimeHorizon => {
            if draft.time_horizon.is_none() {
                reject("Select an investment timeline.");
            }
        }
        Step::RiskTolerance => {
            if draft.risk_tolerance.is_none() {
                reject("Select a risk tolerance.");
            }
        }
        Step::Goals => {
            if draft.goals.is_empty() {
                reject("Select at least one investment goal.");
            }
        }
        Step::Experience => {
            if draft.experience.is_none() {
                reject("Select an experience level.");
            }
        }
    }

    errors
}

fn build_profile(draft: &ProfileDraft) -> Result<Profile, Vec<FieldError>> {
    let errors: Vec<FieldError> = Step::ALL
        .iter()
        .flat_map(|&step| validate_step(step, draft))
        .collect();
    if !errors.is_empty() {
        return Err(errors);
    }

    let ProfileDraft {
        name: Some(name),
        age: Some(age),
        annual_income: Some(annual_income),
        investment_amount: Some(investment_amount),
        time_horizon: Some(time_horizon),
        risk_tolerance: Some(risk_tolerance),
        goals,
        experience: Some(experience),
    } = draft.clone()
    else {
        return Err(vec![FieldError {
            field: "profile",
            message: "Profile is incomplete.",
        }]);
    };

    Ok(Profile {
        name: name.trim().to_string(),
        age,
        annual_income,
        income_range: income_range(annual_income),
        investment_amount,
        time_horizon,
        risk_tolerance,
        goals,
        experience,
    })
}

#[derive(Debug)]
pub struct IntakeWizard {
    step: Step,
    draft: ProfileDraft,
    errors: Vec<FieldError>,
    in_flight: AtomicBool,
    completed: AtomicBool,
}

impl Default for IntakeWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeWizard {
    pub fn new() -> Self {
        IntakeWizard {
            step: Step::first(),
            draft: ProfileDraft::default(),
            errors: Vec::new(),
            in_flight: AtomicBool::new(false),
            completed: AtomicBool::new(false),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft = ProfileDraft {
            name: Some(name.into()),
            ..self.draft.clone()
        };
    }

    pub fn set_age(&mut self, age: u32) {
        self.draft = ProfileDraft {
            age: Some(age),
            ..self.draft.clone()
        };
    }

    pub fn set_annual_income(&mut self, annual_income: f64) {
        self.draft = ProfileDraft {
            annual_income: Some(annual_income),
            ..self.draft.clone()
        };
    }

    pub fn set_investment_amount(&mut self, investment_amount: f64) {
        self.draft = ProfileDraft {
            investment_amount: Some(investment_amount),
            ..self.draft.clone()
        };
    }

    pub fn set_time_horizon(&mut self, time_horizon: TimeHorizon) {
        self.draft = ProfileDraft {
            time_horizon: Some(time_horizon),
            ..self.draft.clone()
        };
    }

    pub fn set_risk_tolerance(&mut self, risk_tolerance: RiskTolerance) {
        self.draft = ProfileDraft {
            risk_tolerance: Some(risk_tolerance),
            ..self.draft.clone()
        };
    }

    pub fn toggle_goal(&mut self, goal: Goal) {
        let mut goals = self.draft.goals.clone();
        match goals.iter().position(|g| *g == goal) {
            Some(i) => {
                goals.remove(i);
            }
            None => goals.push(goal),
        }
        self.draft = ProfileDraft {
            goals,
            ..self.draft.clone()
        };
    }

    pub fn set_experience(&mut self, experience: Experience) {
        self.draft = ProfileDraft {
            experience: Some(experience),
            ..self.draft.clone()
        };
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        let errors = validate_step(self.step, &self.draft);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return AdvanceOutcome::Rejected(errors);
        }

        self.errors.clear();
        match self.step.next() {
            Some(next) => {
                self.step = next;
                AdvanceOutcome::Advanced(next)
            }
            None => AdvanceOutcome::ReadyToFinalize,
        }
    }

    pub fn retreat(&mut self) -> RetreatOutcome {
        self.errors.clear();
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                RetreatOutcome::MovedBack(prev)
            }
            None => RetreatOutcome::ExitWizard,
        }
    }

    pub async fn finalize(
        &self,
        submitter: &dyn ProfileSubmitter,
    ) -> Result<Profile, FinalizeError> {
        if self.completed.load(Ordering::SeqCst) {
            return Err(FinalizeError::AlreadyCompleted);
        }

        let profile = build_profile(&self.draft).map_err(FinalizeError::Invalid)?;

        let _guard =
            InFlightGuard::acquire(&self.in_flight).ok_or(FinalizeError::AlreadyInFlight)?;
        submitter.submit(&profile).await?;
        self.completed.store(true, Ordering::SeqCst);
        Ok(profile)
    }
}

// Released on drop so a cancelled submission cannot wedge the wizard.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then_some(InFlightGuard { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingSubmitter {
        submitted: Mutex<Vec<Profile>>,
    }

    impl RecordingSubmitter {
        fn new() -> Self {
            RecordingSubmitter {
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.submitted.lock().expect("lock poisoned").len()
        }
    }

    #[async_trait]
    impl ProfileSubmitter for RecordingSubmitter {
        async fn submit(&self, profile: &Profile) -> Result<(), SubmissionError> {
            self.submitted
                .lock()
                .expect("lock poisoned")
                .push(profile.clone());
            Ok(())
        }
    }

    struct FailingSubmitter;

    #[async_trait]
    impl ProfileSubmitter for FailingSubmitter {
        async fn submit(&self, _profile: &Profile) -> Result<(), SubmissionError> {
            Err(SubmissionError {
                message: "profiles table unavailable".to_string(),
            })
        }
    }

    struct PendingSubmitter;

    #[async_trait]
    impl ProfileSubmitter for PendingSubmitter {
        async fn submit(&self, _profile: &Profile) -> Result<(), SubmissionError> {
            std::future::pending().await
        }
    }

    struct GatedSubmitter {
        gate: Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl ProfileSubmitter for GatedSubmitter {
        async fn submit(&self, _profile: &Profile) -> Result<(), SubmissionError> {
            let gate = self.gate.lock().expect("lock poisoned").take();
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            Ok(())
        }
    }

    fn filled_wizard() -> IntakeWizard {
        let mut wizard = IntakeWizard::new();
        wizard.set_name("  Jane Doe ");
        assert_eq!(wizard.advance(), AdvanceOutcome::Advanced(Step::Age));
        wizard.set_age(30);
        assert_eq!(wizard.advance(), AdvanceOutcome::Advanced(Step::Income));
        wizard.set_annual_income(80_000.0);
        assert_eq!(
            wizard.advance(),
            AdvanceOutcome::Advanced(Step::InvestmentAmount)
        );
        wizard.set_investment_amount(10_000.0);
        assert_eq!(
            wizard.advance(),
            AdvanceOutcome::Advanced(Step::TimeHorizon)
        );
        wizard.set_time_horizon(TimeHorizon::Long);
        assert_eq!(
            wizard.advance(),
            AdvanceOutcome::Advanced(Step::RiskTolerance)
        );
        wizard.set_risk_tolerance(RiskTolerance::Aggressive);
        assert_eq!(wizard.advance(), AdvanceOutcome::Advanced(Step::Goals));
        wizard.toggle_goal(Goal::RetirementPlanning);
        assert_eq!(wizard.advance(), AdvanceOutcome::Advanced(Step::Experience));
        wizard.set_experience(Experience::Intermediate);
        wizard
    }

    #[test]
    fn new_wizard_starts_empty_at_the_first_step() {
        let wizard = IntakeWizard::new();
        assert_eq!(wizard.step(), Step::Name);
        assert_eq!(wizard.draft(), &ProfileDraft::default());
        assert!(wizard.errors().is_empty());
        assert!(!wizard.is_completed());
    }

    #[test]
    fn advance_rejects_invalid_input_and_stays_on_the_step() {
        let mut wizard = IntakeWizard::new();
        wizard.set_name("J");
        let outcome = wizard.advance();
        let AdvanceOutcome::Rejected(errors) = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
        assert_eq!(wizard.step(), Step::Name);
        assert_eq!(wizard.errors(), errors.as_slice());
    }

    #[test]
    fn underage_applicant_stays_on_the_age_step() {
        let mut wizard = IntakeWizard::new();
        wizard.set_name("Jane Doe");
        assert_eq!(wizard.advance(), AdvanceOutcome::Advanced(Step::Age));
        wizard.set_age(15);
        let AdvanceOutcome::Rejected(errors) = wizard.advance() else {
            panic!("expected rejection");
        };
        assert_eq!(errors[0].field, "age");
        assert_eq!(errors[0].message, "Age must be between 18 and 100.");
        assert_eq!(wizard.step(), Step::Age);
    }

    #[test]
    fn full_walkthrough_reaches_the_finalize_boundary() {
        let mut wizard = filled_wizard();
        assert_eq!(wizard.step(), Step::Experience);
        assert_eq!(wizard.advance(), AdvanceOutcome::ReadyToFinalize);
        assert_eq!(wizard.step(), Step::Experience);
    }

    #[test]
    fn toggle_goal_adds_and_removes_without_duplicates() {
        let mut wizard = IntakeWizard::new();
        wizard.toggle_goal(Goal::EmergencyFund);
        wizard.toggle_goal(Goal::BuyingAHome);
        assert_eq!(
            wizard.draft().goals,
            vec![Goal::EmergencyFund, Goal::BuyingAHome]
        );
        wizard.toggle_goal(Goal::EmergencyFund);
        assert_eq!(wizard.draft().goals, vec![Goal::BuyingAHome]);
    }

    #[test]
    fn retreat_from_the_first_step_exits_the_wizard() {
        let mut wizard = IntakeWizard::new();
        wizard.set_name("X");
        let _ = wizard.advance();
        assert!(!wizard.errors().is_empty());

        assert_eq!(wizard.retreat(), RetreatOutcome::ExitWizard);
        assert!(wizard.errors().is_empty());
        assert_eq!(wizard.draft().name.as_deref(), Some("X"));
    }

    #[test]
    fn retreat_moves_back_and_keeps_entered_values() {
        let mut wizard = IntakeWizard::new();
        wizard.set_name("Jane Doe");
        assert_eq!(wizard.advance(), AdvanceOutcome::Advanced(Step::Age));
        wizard.set_age(44);
        assert_eq!(wizard.retreat(), RetreatOutcome::MovedBack(Step::Name));
        assert_eq!(wizard.draft().age, Some(44));
    }

    #[tokio::test]
    async fn finalize_builds_the_profile_and_submits_once() {
        let mut wizard = filled_wizard();
        assert_eq!(wizard.advance(), AdvanceOutcome::ReadyToFinalize);

        let submitter = RecordingSubmitter::new();
        let profile = wizard
            .finalize(&submitter)
            .await
            .expect("finalize should succeed");

        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.age, 30);
        assert_eq!(profile.income_range, "$50,000 - $99,999");
        assert_eq!(profile.goals, vec![Goal::RetirementPlanning]);
        assert_eq!(submitter.count(), 1);
        assert!(wizard.is_completed());

        assert_eq!(
            wizard.finalize(&submitter).await,
            Err(FinalizeError::AlreadyCompleted)
        );
        assert_eq!(submitter.count(), 1);
    }

    #[tokio::test]
    async fn finalize_with_incomplete_draft_never_submits() {
        let wizard = IntakeWizard::new();
        let submitter = RecordingSubmitter::new();
        let Err(FinalizeError::Invalid(errors)) = wizard.finalize(&submitter).await else {
            panic!("expected invalid-draft error");
        };
        assert!(!errors.is_empty());
        assert_eq!(submitter.count(), 0);
    }

    #[tokio::test]
    async fn submission_failure_is_recoverable_and_keeps_entered_data() {
        let wizard = filled_wizard();
        let draft_before = wizard.draft().clone();

        let result = wizard.finalize(&FailingSubmitter).await;
        assert_eq!(
            result,
            Err(FinalizeError::Submission(SubmissionError {
                message: "profiles table unavailable".to_string(),
            }))
        );
        assert_eq!(wizard.draft(), &draft_before);
        assert!(!wizard.is_completed());

        let submitter = RecordingSubmitter::new();
        wizard
            .finalize(&submitter)
            .await
            .expect("retry should succeed");
        assert_eq!(submitter.count(), 1);
    }

    #[tokio::test]
    async fn duplicate_finalize_is_rejected_while_one_is_pending() {
        let wizard = filled_wizard();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let gated = GatedSubmitter {
            gate: Mutex::new(Some(rx)),
        };
        let fast = RecordingSubmitter::new();

        let (first, second, ()) = tokio::join!(wizard.finalize(&gated), wizard.finalize(&fast), async {
            let _ = tx.send(());
        });

        assert!(first.is_ok());
        assert_eq!(second, Err(FinalizeError::AlreadyInFlight));
        assert_eq!(fast.count(), 0);
    }

    #[tokio::test]
    async fn cancelled_submission_releases_the_in_flight_guard() {
        let wizard = filled_wizard();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), wizard.finalize(&PendingSubmitter))
                .await;
        assert!(abandoned.is_err());

        let submitter = RecordingSubmitter::new();
        wizard
            .finalize(&submitter)
            .await
            .expect("guard must be released after cancellation");
        assert_eq!(submitter.count(), 1);
    }
}
