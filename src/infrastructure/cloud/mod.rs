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

//! Cloud identity providers: the AWS and Azure CLIs.

pub mod aws;
pub mod azure;

pub use aws::AwsCli;
pub use azure::{AksCluster, AzureCli, AzureSubscription};

use crate::shared::error::Result;

/// Common checks every cloud CLI answers.
#[async_trait::async_trait]
pub trait IdentityCli: Send + Sync {
    fn tool(&self) -> &'static str;

    /// Fails with `ToolMissing` when the binary is absent or broken.
    async fn ensure_installed(&self) -> Result<()>;

    async fn has_active_session(&self) -> Result<bool>;
}
