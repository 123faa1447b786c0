// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cluster and cloud selection rules shared by `init` and `use-cluster`.

use crate::domain::config::CloudKind;
use crate::shared::error::{JeraError, Result};

/// Suffix appended to the currently selected entry of a choice list.
pub const CURRENT_MARKER: &str = " (current)";

/// Decide which cloud `use-cluster` targets.
///
/// `--switch` flips the saved type and wins over the explicit flags.
pub fn resolve_cloud_kind(
    saved: CloudKind,
    aws: bool,
    azure: bool,
    switch: bool,
) -> Result<CloudKind> {
    if switch {
        return Ok(saved.toggled());
    }
    match (aws, azure) {
        (true, true) => Err(JeraError::config_error(
            "--aws and --azure cannot be used together",
        )),
        (true, false) => Ok(CloudKind::Aws),
        (false, true) => Ok(CloudKind::Azure),
        (false, false) => Ok(saved),
    }
}

/// Build choice labels, tagging the entry equal to `current`.
pub fn mark_current(options: &[String], current: Option<&str>) -> Vec<String> {
    options
        .iter()
        .map(|o| {
            if Some(o.as_str()) == current {
                format!("{}{}", o, CURRENT_MARKER)
            } else {
                o.clone()
            }
        })
        .collect()
}

pub fn strip_current_marker(choice: &str) -> &str {
    choice.strip_suffix(CURRENT_MARKER).unwrap_or(choice)
}

/// Choice label for an AKS cluster.
pub fn aks_choice_label(name: &str, resource_group: &str) -> String {
    format!("{} (Group: {})", name, resource_group)
}
