//! Static route table mapping URL paths to views.
//!
//! Patterns are matched segment by segment; `:name` captures one non-empty
//! segment. Literal segments compare ASCII case-insensitively, as in the
//! browser router. Trailing slashes and query strings are ignored, and the
//! first matching entry wins.
//!
//! Captured parameters are returned exactly as they appear in the path.
//! Unlike the browser router they are not percent-decoded, so `/datasets/%31`
//! captures `%31` and fails `id_param`.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    About,
    Home,
    Signup,
    Login,
    Dashboard,
    Datasets,
    DatasetDetails,
    Models,
    ModelDetails,
    Trainings,
    TrainingDetails,
    Admin,
    AdminUsers,
    AdminDatasets,
    AdminDatasetDetails,
    AdminModels,
    AdminModelDetails,
}

impl View {
    /// Stable route name.
    pub fn name(&self) -> &'static str {
        match self {
            View::About => "about",
            View::Home => "home",
            View::Signup => "signup",
            View::Login => "login",
            View::Dashboard => "dashboard",
            View::Datasets => "datasets",
            View::DatasetDetails => "dataset-details",
            View::Models => "models",
            View::ModelDetails => "models-details",
            View::Trainings => "trainings",
            View::TrainingDetails => "training-details",
            View::Admin => "admin",
            View::AdminUsers => "admin-users",
            View::AdminDatasets => "admin-datasets",
            View::AdminDatasetDetails => "admin-dataset-details",
            View::AdminModels => "admin-models",
            View::AdminModelDetails => "admin-model-details",
        }
    }

    /// Whether rendering this view needs a stored token.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, View::About | View::Home | View::Signup | View::Login)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Route table in match order.
pub const ROUTES: &[(&str, View)] = &[
    ("/about", View::About),
    ("/", View::Home),
    ("/signin", View::Signup),
    ("/login", View::Login),
    ("/dashboard", View::Dashboard),
    ("/datasets", View::Datasets),
    ("/datasets/:dataset_id", View::DatasetDetails),
    ("/models", View::Models),
    ("/models/:model_id", View::ModelDetails),
    ("/trainings", View::Trainings),
    ("/trainings/:training_id", View::TrainingDetails),
    ("/admin", View::Admin),
    ("/admin/users", View::AdminUsers),
    ("/admin/datasets", View::AdminDatasets),
    ("/admin/datasets/:dataset_id", View::AdminDatasetDetails),
    ("/admin/models", View::AdminModels),
    ("/admin/models/:model_id", View::AdminModelDetails),
];

/// A resolved path: the view plus captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub view: View,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// A captured parameter parsed as a numeric id.
    pub fn id_param(&self, name: &str) -> Option<i64> {
        self.param(name).and_then(|v| v.parse().ok())
    }
}

fn segments(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_pattern(pattern: &str, path_segments: &[&str]) -> Option<BTreeMap<String, String>> {
    let pattern_segments = segments(pattern);
    if pattern_segments.len() != path_segments.len() {
        return None;
    }
    let mut params = BTreeMap::new();
    for (pat, seg) in pattern_segments.iter().zip(path_segments) {
        if let Some(name) = pat.strip_prefix(':') {
            params.insert(name.to_string(), (*seg).to_string());
        } else if !pat.eq_ignore_ascii_case(seg) {
            return None;
        }
    }
    Some(params)
}

/// Resolve a path against `ROUTES`.
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path_segments = segments(path);
    ROUTES.iter().find_map(|(pattern, view)| {
        match_pattern(pattern, &path_segments).map(|params| RouteMatch { view: *view, params })
    })
}
