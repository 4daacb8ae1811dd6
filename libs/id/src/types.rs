//! Typed ID definitions for orchestrator resources.

use crate::define_id;

define_id!(DeploymentId, "dep");
define_id!(ServiceId, "svc");
