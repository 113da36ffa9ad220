use crate::utils::keys::normalize_prefix;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Folder to list; empty lists the bucket root
    #[serde(default)]
    pub prefix: String,
    /// Maximum number of entries to return (0 or absent: all)
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn normalized(self) -> Self {
        Self {
            prefix: normalize_prefix(&self.prefix),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Folder scope; empty searches the whole bucket
    #[serde(default)]
    pub in_folder: String,
    /// Case-insensitive substring matched against full keys
    #[serde(default)]
    pub keyword: String,
}

impl SearchQuery {
    pub fn normalized(self) -> Self {
        Self {
            in_folder: normalize_prefix(&self.in_folder),
            keyword: self.keyword.trim().to_lowercase(),
        }
    }
}
