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

// Core modules
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export commonly used types
pub use cli::AppContext;
pub use domain::config::{ConfigRepository, FileConfigRepository, JeraConfig};
pub use domain::quantity::{format_cpu, format_memory, parse_quantity, ResourceKind};
pub use domain::usage::{ClusterReport, NodeReport, ScopeReport};
pub use infrastructure::kubernetes::{ClusterResourceProvider, Kubectl, MetricsSource};
pub use infrastructure::process::{CommandRunner, SystemRunner};
pub use shared::{ExitKind, JeraError, Result};
