//! Authorization checks for privileged attributes.
//!
//! The engine consults a [`Policy`] before exposing or accepting the
//! attributes that ordinary tenants must not control: provider-network
//! bindings and port-security flags. Deployments swap in their own
//! implementation; [`RoleBasedPolicy`] is the default.

use crate::error::CoreError;

/// Actions the engine asks a policy about.
pub mod action {
    /// View provider attributes on a network.
    pub const PROVIDER_VIEW: &str = "network:provider:view";
    /// Set provider attributes at network creation.
    pub const PROVIDER_SET: &str = "network:provider:set";
    /// Set the port-security flag when creating a resource.
    pub const PORT_SECURITY_CREATE: &str = "port-security:create";
    /// Change the port-security flag on an existing resource.
    pub const PORT_SECURITY_UPDATE: &str = "port-security:update";
}

/// Caller identity for one engine operation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant_id: String,
    pub is_admin: bool,
}

impl RequestContext {
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            is_admin: true,
        }
    }
}

/// Authorization seam.
pub trait Policy: Send + Sync {
    /// May the caller see values gated by `action`? A `false` here hides
    /// the values; it never fails the operation.
    fn check_view(&self, ctx: &RequestContext, action: &str) -> bool;

    /// Require permission to set values gated by `action`.
    fn enforce_set(&self, ctx: &RequestContext, action: &str) -> Result<(), CoreError>;
}

/// Default policy: provider attributes are admin-only, port-security
/// flags may be set by any caller on resources they own (ownership is
/// checked by the engine, not here). Unknown actions are denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleBasedPolicy;

impl Policy for RoleBasedPolicy {
    fn check_view(&self, ctx: &RequestContext, action: &str) -> bool {
        match action {
            action::PROVIDER_VIEW => ctx.is_admin,
            action::PORT_SECURITY_CREATE | action::PORT_SECURITY_UPDATE => true,
            _ => false,
        }
    }

    fn enforce_set(&self, ctx: &RequestContext, action: &str) -> Result<(), CoreError> {
        let allowed = match action {
            action::PROVIDER_SET => ctx.is_admin,
            action::PORT_SECURITY_CREATE | action::PORT_SECURITY_UPDATE => true,
            _ => ctx.is_admin,
        };
        if allowed {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                action: action.to_owned(),
            })
        }
    }
}
