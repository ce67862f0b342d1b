use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{
        profile::{EmploymentEntry, ProfilePatch, ProfileRecord},
        resume::ResumeRecord,
    },
    services::resume::format_file_size,
};

/// Sentinel university value meaning "use the free-text field".
pub const OTHER_UNIVERSITY: &str = "other";

/// Universities selectable by code.
const UNIVERSITIES: &[(&str, &str)] = &[
    ("um", "University of Malaya"),
    ("ukm", "Universiti Kebangsaan Malaysia"),
    ("usm", "Universiti Sains Malaysia"),
    ("upm", "Universiti Putra Malaysia"),
    ("utm", "Universiti Teknologi Malaysia"),
    ("taylors", "Taylor's University"),
    ("monash", "Monash University Malaysia"),
];

/// Onboarding wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    CoreIdentity,
    Education,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 3] = [
        WizardStep::CoreIdentity,
        WizardStep::Education,
        WizardStep::Review,
    ];
}

/// When a field must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
    /// Required only while another field holds a given value.
    RequiredWhen {
        field: &'static str,
        equals: &'static str,
    },
}

/// How a value is rendered in the summary view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    Plain,
    /// ISO `YYYY-MM-DD`, rendered as `15 Mar 2001`.
    Date,
}

impl Formatter {
    pub fn apply(&self, value: &str) -> String {
        let value = value.trim();
        match self {
            Formatter::Plain => value.to_string(),
            Formatter::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| d.format("%-d %b %Y").to_string())
                .unwrap_or_else(|_| value.to_string()),
        }
    }
}

/// Where a field is shown in the summary view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Personal,
    Bio,
    Skills,
    Education,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub requirement: Requirement,
    pub formatter: Formatter,
    pub section: Section,
    pub step: WizardStep,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        label: &'static str,
        requirement: Requirement,
        section: Section,
        step: WizardStep,
    ) -> Self {
        Self {
            name,
            label,
            requirement,
            formatter: Formatter::Plain,
            section,
            step,
        }
    }

    pub const fn dated(mut self) -> Self {
        self.formatter = Formatter::Date;
        self
    }

    /// Whether this field must be filled in, given the rest of `profile`.
    pub fn is_required_for(&self, profile: &ProfileRecord) -> bool {
        match self.requirement {
            Requirement::Required => true,
            Requirement::Optional => false,
            Requirement::RequiredWhen { field, equals } => profile
                .filled(field)
                .is_some_and(|v| v.eq_ignore_ascii_case(equals)),
        }
    }
}

/// The declarative field set shared by the evaluator, the wizard and the summary view.
#[derive(Debug, Clone)]
pub struct ProfileSchema {
    fields: Vec<FieldSpec>,
}

impl Default for ProfileSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl ProfileSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// The portal's onboarding profile.
    pub fn standard() -> Self {
        use Requirement::{Optional, Required, RequiredWhen};
        use Section as S;
        use WizardStep as W;

        Self::new(vec![
            FieldSpec::new("firstName", "First Name", Required, S::Personal, W::CoreIdentity),
            FieldSpec::new("lastName", "Last Name", Required, S::Personal, W::CoreIdentity),
            FieldSpec::new("email", "Email", Required, S::Personal, W::CoreIdentity),
            FieldSpec::new("phone", "Phone", Required, S::Personal, W::CoreIdentity),
            FieldSpec::new("dateOfBirth", "Date of Birth", Required, S::Personal, W::CoreIdentity)
                .dated(),
            FieldSpec::new("address", "Address", Required, S::Personal, W::CoreIdentity),
            FieldSpec::new("city", "City", Required, S::Personal, W::CoreIdentity),
            FieldSpec::new("country", "Country", Required, S::Personal, W::CoreIdentity),
            FieldSpec::new("bio", "Professional Summary", Optional, S::Bio, W::CoreIdentity),
            FieldSpec::new("skills", "Skills", Optional, S::Skills, W::CoreIdentity),
            FieldSpec::new("university", "University", Required, S::Education, W::Education),
            FieldSpec::new(
                "otherUniversity",
                "University Name",
                RequiredWhen {
                    field: "university",
                    equals: OTHER_UNIVERSITY,
                },
                S::Education,
                W::Education,
            ),
            FieldSpec::new("course", "Course", Required, S::Education, W::Education),
            FieldSpec::new("grade", "Grade", Required, S::Education, W::Education),
            FieldSpec::new("studyStart", "Study Start", Required, S::Education, W::Education)
                .dated(),
            FieldSpec::new("graduationDate", "Graduation Date", Required, S::Education, W::Education)
                .dated(),
        ])
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields_for_step(&self, step: WizardStep) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.step == step)
    }

    fn display_value(&self, profile: &ProfileRecord, name: &str) -> Option<String> {
        let value = profile.filled(name)?;
        let formatter = self.field(name).map_or(Formatter::Plain, |f| f.formatter);
        Some(formatter.apply(value))
    }

    /// Rejects patches naming fields the schema does not know.
    pub fn check_patch(&self, patch: &ProfilePatch) -> Result<()> {
        let unknown: Vec<&str> = patch
            .fields
            .keys()
            .map(String::as_str)
            .filter(|name| self.field(name).is_none())
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Unknown profile fields: {}",
                unknown.join(", ")
            )))
        }
    }
}

/// Completeness of a profile against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    Incomplete { missing: Vec<&'static str> },
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completeness::Complete)
    }

    pub fn missing(&self) -> &[&'static str] {
        match self {
            Completeness::Complete => &[],
            Completeness::Incomplete { missing } => missing,
        }
    }
}

fn missing_fields<'a>(
    fields: impl Iterator<Item = &'a FieldSpec>,
    profile: &ProfileRecord,
) -> Vec<&'static str> {
    fields
        .filter(|f| f.is_required_for(profile) && profile.filled(f.name).is_none())
        .map(|f| f.name)
        .collect()
}

/// Complete iff every field the schema requires is present and non-blank after trimming.
pub fn evaluate(schema: &ProfileSchema, profile: &ProfileRecord) -> Completeness {
    let missing = missing_fields(schema.fields().iter(), profile);
    if missing.is_empty() {
        Completeness::Complete
    } else {
        Completeness::Incomplete { missing }
    }
}

/// Display name of the selected university.
pub fn university_name(profile: &ProfileRecord) -> Option<String> {
    let selected = profile.filled("university")?;
    if selected.eq_ignore_ascii_case(OTHER_UNIVERSITY) {
        return profile.filled("otherUniversity").map(str::to_string);
    }
    let name = UNIVERSITIES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(selected))
        .map_or(selected, |(_, name)| *name);
    Some(name.to_string())
}

/// Splits a comma-separated skills string, dropping blank entries.
pub fn parse_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Which optional sections of the summary view are shown.
pub mod display {
    use super::*;

    pub fn bio_visible(profile: &ProfileRecord) -> bool {
        profile.filled("bio").is_some()
    }

    pub fn skills_visible(profile: &ProfileRecord) -> bool {
        profile.filled("skills").is_some()
    }

    pub fn education_visible(profile: &ProfileRecord) -> bool {
        profile.filled("university").is_some() && profile.filled("course").is_some()
    }

    pub fn employment_visible(profile: &ProfileRecord) -> bool {
        profile.employment.iter().any(EmploymentEntry::is_counted)
    }

    pub fn resume_visible(resume: Option<&ResumeRecord>) -> bool {
        resume.is_some_and(|r| !r.file_name.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationSummary {
    pub university: String,
    pub course: String,
    pub grade: String,
    pub dates: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub file_name: String,
    pub file_size: String,
    pub file_type: String,
}

/// Read-only view of a complete profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub name: String,
    pub personal: Vec<DisplayField>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<EducationSummary>,
    pub employment: Option<Vec<EmploymentEntry>>,
    pub resume: Option<ResumeSummary>,
}

/// Builds the summary view, applying the display policy section by section.
pub fn summarize(
    schema: &ProfileSchema,
    profile: &ProfileRecord,
    resume: Option<&ResumeRecord>,
) -> ProfileSummary {
    let name = [profile.filled("firstName"), profile.filled("lastName")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let personal = schema
        .fields()
        .iter()
        .filter(|f| f.section == Section::Personal)
        .filter_map(|f| {
            profile.filled(f.name).map(|value| DisplayField {
                label: f.label,
                value: f.formatter.apply(value),
            })
        })
        .collect();

    let bio = display::bio_visible(profile)
        .then(|| profile.filled("bio").unwrap_or_default().to_string());

    let skills = display::skills_visible(profile)
        .then(|| parse_skills(profile.value("skills").unwrap_or_default()));

    let education = display::education_visible(profile).then(|| {
        let start = schema.display_value(profile, "studyStart").unwrap_or_default();
        let end = schema.display_value(profile, "graduationDate").unwrap_or_default();
        EducationSummary {
            university: university_name(profile).unwrap_or_default(),
            course: profile.filled("course").unwrap_or_default().to_string(),
            grade: format!("Grade: {}", profile.filled("grade").unwrap_or_default()),
            dates: format!("{} - {}", start, end),
        }
    });

    let employment = display::employment_visible(profile)
        .then(|| profile.counted_employment().into_iter().cloned().collect());

    let resume = resume
        .filter(|r| display::resume_visible(Some(*r)))
        .map(|r| ResumeSummary {
            file_name: r.file_name.clone(),
            file_size: format_file_size(r.file_size),
            file_type: r.file_type.clone(),
        });

    ProfileSummary {
        name,
        personal,
        bio,
        skills,
        education,
        employment,
        resume,
    }
}

/// What the profile page shows: the editable form or the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum ProfileView {
    Form {
        prefill: ProfileRecord,
        missing: Vec<&'static str>,
    },
    Summary { summary: ProfileSummary },
}

/// Picks the view for `profile`. Incomplete profiles re-open the form pre-filled.
pub fn view(
    schema: &ProfileSchema,
    profile: &ProfileRecord,
    resume: Option<&ResumeRecord>,
) -> ProfileView {
    match evaluate(schema, profile) {
        Completeness::Complete => ProfileView::Summary {
            summary: summarize(schema, profile, resume),
        },
        Completeness::Incomplete { missing } => ProfileView::Form {
            prefill: profile.clone(),
            missing,
        },
    }
}

/// Whether the wizard may advance past a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepGate {
    pub step: WizardStep,
    pub ready: bool,
    pub missing_fields: Vec<&'static str>,
    pub resume_missing: bool,
}

/// Evaluates the gate of one wizard step.
///
/// The first step also needs an attached resume. The review step needs the whole
/// profile to be complete.
pub fn gate_step(
    schema: &ProfileSchema,
    step: WizardStep,
    profile: &ProfileRecord,
    resume_attached: bool,
) -> StepGate {
    let missing_fields = match step {
        WizardStep::Review => evaluate(schema, profile).missing().to_vec(),
        _ => missing_fields(schema.fields_for_step(step), profile),
    };
    let resume_missing = step == WizardStep::CoreIdentity && !resume_attached;

    StepGate {
        step,
        ready: missing_fields.is_empty() && !resume_missing,
        missing_fields,
        resume_missing,
    }
}

/// Gates of every wizard step, in order.
pub fn onboarding(
    schema: &ProfileSchema,
    profile: &ProfileRecord,
    resume_attached: bool,
) -> Vec<StepGate> {
    WizardStep::ALL
        .iter()
        .map(|step| gate_step(schema, *step, profile, resume_attached))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const COMPLETE: &[(&str, &str)] = &[
        ("firstName", "Aisha"),
        ("lastName", "Rahman Binti Ali"),
        ("email", "aisha@example.com"),
        ("phone", "+60 12-345 6789"),
        ("dateOfBirth", "2001-03-15"),
        ("address", "12 Jalan Ampang"),
        ("city", "Kuala Lumpur"),
        ("country", "Malaysia"),
        ("university", "um"),
        ("course", "Computer Science"),
        ("grade", "3.8"),
        ("studyStart", "2019-09-01"),
        ("graduationDate", "2023-07-01"),
    ];

    fn profile(pairs: &[(&str, &str)]) -> ProfileRecord {
        let mut record = ProfileRecord::default();
        for (k, v) in pairs {
            record.fields.insert(k.to_string(), v.to_string());
        }
        record
    }

    fn complete() -> ProfileRecord {
        profile(COMPLETE)
    }

    fn resume() -> ResumeRecord {
        ResumeRecord {
            file_name: "cv.pdf".to_string(),
            file_size: 1536,
            upload_date: Utc::now(),
            file_type: "application/pdf".to_string(),
        }
    }

    #[test]
    fn full_profile_is_complete() {
        assert_eq!(evaluate(&ProfileSchema::standard(), &complete()), Completeness::Complete);
    }

    #[test]
    fn each_required_field_is_needed() {
        let schema = ProfileSchema::standard();
        for (name, _) in COMPLETE {
            let mut p = complete();
            p.fields.remove(*name);
            assert_eq!(
                evaluate(&schema, &p),
                Completeness::Incomplete { missing: vec![*name] },
                "removing {} should leave the profile incomplete",
                name
            );
        }
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let mut p = complete();
        p.fields.insert("city".to_string(), "   \t".to_string());
        assert_eq!(
            evaluate(&ProfileSchema::standard(), &p).missing(),
            &["city"]
        );
    }

    #[test]
    fn optional_fields_do_not_affect_completeness() {
        let mut p = complete();
        p.fields.insert("bio".to_string(), String::new());
        p.employment.push(EmploymentEntry {
            company: "TechNova".to_string(),
            ..Default::default()
        });
        assert!(evaluate(&ProfileSchema::standard(), &p).is_complete());
    }

    #[test]
    fn swapping_the_schema_swaps_the_rule() {
        let schema = ProfileSchema::new(vec![FieldSpec::new(
            "nickname",
            "Nickname",
            Requirement::Required,
            Section::Personal,
            WizardStep::CoreIdentity,
        )]);
        assert_eq!(evaluate(&schema, &complete()).missing(), &["nickname"]);
        assert!(evaluate(&schema, &profile(&[("nickname", "Ash")])).is_complete());
    }

    #[test]
    fn other_university_requires_free_text_name() {
        let schema = ProfileSchema::standard();
        let mut p = complete();
        p.fields.insert("university".to_string(), "other".to_string());
        assert_eq!(evaluate(&schema, &p).missing(), &["otherUniversity"]);
        assert_eq!(university_name(&p), None);

        p.fields.insert("otherUniversity".to_string(), " Sunway University ".to_string());
        assert!(evaluate(&schema, &p).is_complete());
        assert_eq!(university_name(&p).as_deref(), Some("Sunway University"));
    }

    #[test]
    fn university_codes_resolve_from_lookup() {
        assert_eq!(university_name(&complete()).as_deref(), Some("University of Malaya"));
        let p = profile(&[("university", "Unknown College")]);
        assert_eq!(university_name(&p).as_deref(), Some("Unknown College"));
    }

    #[test]
    fn saving_country_later_flips_to_complete() {
        let schema = ProfileSchema::standard();
        let mut stored = ProfileRecord::default();
        let mut first = ProfilePatch::default();
        for (k, v) in COMPLETE.iter().filter(|(k, _)| *k != "country") {
            first = first.with(k, v);
        }
        stored.merge(first);
        assert_eq!(evaluate(&schema, &stored).missing(), &["country"]);

        stored.merge(ProfilePatch::default().with("country", "Malaysia"));
        assert!(evaluate(&schema, &stored).is_complete());
    }

    #[test]
    fn unknown_patch_fields_are_rejected() {
        let schema = ProfileSchema::standard();
        let patch = ProfilePatch::default().with("favouriteColour", "blue");
        assert!(matches!(schema.check_patch(&patch), Err(AppError::Validation(_))));
        assert!(schema.check_patch(&ProfilePatch::default().with("city", "Ipoh")).is_ok());
    }

    #[test]
    fn skills_split_trim_and_drop_empties() {
        assert_eq!(
            parse_skills(" Rust, ,SQL ,, React "),
            vec!["Rust".to_string(), "SQL".to_string(), "React".to_string()]
        );
        assert!(parse_skills(" , ").is_empty());
    }

    #[test]
    fn display_policy_rules() {
        let mut p = complete();
        assert!(!display::bio_visible(&p));
        assert!(!display::skills_visible(&p));
        assert!(display::education_visible(&p));
        assert!(!display::employment_visible(&p));

        p.fields.insert("bio".to_string(), "  ".to_string());
        p.fields.insert("skills".to_string(), "Rust".to_string());
        assert!(!display::bio_visible(&p));
        assert!(display::skills_visible(&p));

        p.fields.insert("course".to_string(), String::new());
        assert!(!display::education_visible(&p));

        p.employment.push(EmploymentEntry {
            company: "CloudBridge".to_string(),
            position: "Intern".to_string(),
            start_date: "2022-06-01".to_string(),
            ..Default::default()
        });
        assert!(display::employment_visible(&p));

        assert!(!display::resume_visible(None));
        let mut r = resume();
        assert!(display::resume_visible(Some(&r)));
        r.file_name = " ".to_string();
        assert!(!display::resume_visible(Some(&r)));
    }

    #[test]
    fn summary_formats_sections() {
        let schema = ProfileSchema::standard();
        let mut p = complete();
        p.fields.insert("skills".to_string(), "Rust, SQL".to_string());
        p.employment = vec![
            EmploymentEntry {
                company: "TechNova".to_string(),
                position: "Frontend Developer".to_string(),
                start_date: "2023-08-01".to_string(),
                ..Default::default()
            },
            EmploymentEntry {
                company: "Half Entry".to_string(),
                ..Default::default()
            },
        ];

        let summary = summarize(&schema, &p, Some(&resume()));
        assert_eq!(summary.name, "Aisha Rahman Binti Ali");
        assert!(summary.personal.contains(&DisplayField {
            label: "Date of Birth",
            value: "15 Mar 2001".to_string(),
        }));
        assert_eq!(summary.bio, None);
        assert_eq!(summary.skills, Some(vec!["Rust".to_string(), "SQL".to_string()]));

        let education = summary.education.unwrap();
        assert_eq!(education.university, "University of Malaya");
        assert_eq!(education.grade, "Grade: 3.8");
        assert_eq!(education.dates, "1 Sep 2019 - 1 Jul 2023");

        assert_eq!(summary.employment.map(|e| e.len()), Some(1));
        assert_eq!(summary.resume.unwrap().file_size, "1.5 KB");
    }

    #[test]
    fn view_switches_between_form_and_summary() {
        let schema = ProfileSchema::standard();
        let partial = profile(&[("firstName", "Aisha")]);
        match view(&schema, &partial, None) {
            ProfileView::Form { prefill, missing } => {
                assert_eq!(prefill.value("firstName"), Some("Aisha"));
                assert!(missing.contains(&"lastName"));
            }
            other => panic!("expected form, got {:?}", other),
        }
        assert!(matches!(
            view(&schema, &complete(), None),
            ProfileView::Summary { .. }
        ));
    }

    #[test]
    fn first_step_needs_resume() {
        let schema = ProfileSchema::standard();
        let gate = gate_step(&schema, WizardStep::CoreIdentity, &complete(), false);
        assert!(!gate.ready);
        assert!(gate.resume_missing);
        assert!(gate.missing_fields.is_empty());

        assert!(gate_step(&schema, WizardStep::CoreIdentity, &complete(), true).ready);
    }

    #[test]
    fn steps_gate_on_their_own_fields() {
        let schema = ProfileSchema::standard();
        let p = profile(&COMPLETE[..8]);

        let gates = onboarding(&schema, &p, true);
        assert!(gates[0].ready);
        assert_eq!(gates[1].step, WizardStep::Education);
        assert!(!gates[1].ready);
        assert_eq!(
            gates[1].missing_fields,
            vec!["university", "course", "grade", "studyStart", "graduationDate"]
        );
        assert!(!gates[2].ready);

        assert!(onboarding(&schema, &complete(), true).iter().all(|g| g.ready));
    }
}
