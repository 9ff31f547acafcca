//! Plain-text rendering of API data for the terminal.

use modelhub_core::models::{Dataset, Model, Training, UserProfile};

/// Width of the name column in listings
const NAME_WIDTH: usize = 32;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_optional(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}

/// Format a 0..1 score as a percentage
pub fn format_score(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

pub fn user(profile: &UserProfile) -> String {
    let mut out = format!("{} ({})", profile.email, profile.role_display());
    if let Some(id) = profile.id {
        out.push_str(&format!("\n  id:         {}", id));
    }
    if let Some(ref registered) = profile.registration_date {
        out.push_str(&format!("\n  registered: {}", registered));
    }
    out
}

pub fn users(users: &[UserProfile]) -> String {
    if users.is_empty() {
        return "No users.".to_string();
    }
    users
        .iter()
        .map(|u| {
            format!(
                "{:>6}  {:<width$}  {}",
                u.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
                truncate_string(&u.email, NAME_WIDTH),
                u.role_display(),
                width = NAME_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn named_row(id: i64, name: &str, creation_date: Option<&str>) -> String {
    format!(
        "{:>6}  {:<width$}  {}",
        id,
        truncate_string(name, NAME_WIDTH),
        format_optional(creation_date, "-"),
        width = NAME_WIDTH
    )
}

pub fn datasets(datasets: &[Dataset]) -> String {
    if datasets.is_empty() {
        return "No datasets.".to_string();
    }
    datasets
        .iter()
        .map(|d| named_row(d.id, &d.name, d.creation_date.as_deref()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn dataset(dataset: &Dataset) -> String {
    format!(
        "Dataset #{}\n  name:    {}\n  created: {}",
        dataset.id,
        dataset.name,
        format_optional(dataset.creation_date.as_deref(), "unknown")
    )
}

pub fn models(models: &[Model]) -> String {
    if models.is_empty() {
        return "No models.".to_string();
    }
    models
        .iter()
        .map(|m| named_row(m.id, &m.name, m.creation_date.as_deref()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn model(model: &Model) -> String {
    format!(
        "Model #{}\n  name:    {}\n  created: {}",
        model.id,
        model.name,
        format_optional(model.creation_date.as_deref(), "unknown")
    )
}

pub fn trainings(trainings: &[Training]) -> String {
    if trainings.is_empty() {
        return "No trainings.".to_string();
    }
    trainings
        .iter()
        .map(|t| {
            format!(
                "{:>6}  {:<width$}  P {:>6}  R {:>6}",
                t.id,
                truncate_string(&t.experiment_name, NAME_WIDTH),
                format_score(t.precision),
                format_score(t.recall),
                width = NAME_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn training(training: &Training) -> String {
    format!(
        "Training #{}\n  experiment: {}\n  model:      {} (#{})\n  dataset:    {} (#{})\n  precision:  {}\n  recall:     {}\n  f1:         {}",
        training.id,
        training.experiment_name,
        training.model_name,
        training.model_id,
        training.dataset_name,
        training.dataset_id,
        format_score(training.precision),
        format_score(training.recall),
        format_score(training.f1_score()),
    )
}
