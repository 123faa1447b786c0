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

/// External binaries
pub const DEFAULT_KUBECTL: &str = "kubectl";
pub const AWS_CLI: &str = "aws";
pub const AZURE_CLI: &str = "az";

/// Connectivity check passed to `kubectl --request-timeout`
pub const CONNECTIVITY_TIMEOUT: &str = "5s";

/// AWS defaults
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const AWS_CONFIG_FILE: &str = ".aws/config";

/// Keys an SSO profile needs in `~/.aws/config`
pub const AWS_SSO_KEYS: &[&str] = &[
    "sso_session",
    "sso_account_id",
    "sso_role_name",
    "region",
    "output",
];

/// AWS CLI error markers
pub const AWS_ACCESS_DENIED: &[&str] = &["AccessDeniedException", "UnauthorizedException"];
pub const AWS_EXPIRED_TOKEN: &str = "ExpiredToken";
pub const AWS_RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Azure CLI query listing AKS clusters
pub const AKS_LIST_QUERY: &str = "[].{name:name, resourceGroup:resourceGroup}";

/// Watch refresh interval for `pods -w`, in seconds
pub const WATCH_INTERVAL_SECS: u64 = 1;

/// Default shell for `exec`
pub const DEFAULT_SHELL: &str = "/bin/sh";
