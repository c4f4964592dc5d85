//! Class and project creation.

use ecoledger_types::{
    Address, Bank, Class, CoreParams, EcoError, MsgCreateClass, MsgCreateClassResponse,
    MsgCreateProject, MsgCreateProjectResponse, Project, Result, ids,
};
use ecoledger_state::{State, atomically};
use tracing::info;

/// The batch lifecycle keeper: class, project, and batch operations plus
/// the bridge intake. Holds a read-only snapshot of governance params.
#[derive(Debug, Clone)]
pub struct CoreKeeper {
    pub(crate) params: CoreParams,
    /// Account credited with the credit class fee.
    pub(crate) fee_collector: Address,
}

impl CoreKeeper {
    #[must_use]
    pub fn new(params: CoreParams, fee_collector: Address) -> Self {
        Self {
            params,
            fee_collector,
        }
    }

    /// Create a credit class under an existing credit type. The admin
    /// pays `credit_class_fee` and the listed issuers gain issuance
    /// rights.
    ///
    /// # Errors
    /// `Unauthorized` when the allowlist is enabled and the admin is not
    /// on it; `NotFound` for an unknown credit type.
    pub fn create_class(
        &self,
        state: &mut State,
        bank: &mut dyn Bank,
        msg: &MsgCreateClass,
    ) -> Result<MsgCreateClassResponse> {
        msg.validate_basic()?;
        let admin = Address::new(&msg.admin)?;

        if self.params.allowlist_enabled && !self.params.allowed_class_creators.contains(&admin) {
            return Err(EcoError::Unauthorized(format!(
                "{admin} is not allowed to create credit classes"
            )));
        }
        if state.credit_type(&msg.credit_type_abbrev).is_none() {
            return Err(EcoError::NotFound(format!(
                "credit type {}",
                msg.credit_type_abbrev
            )));
        }

        let fee_collector = self.fee_collector.clone();
        let fee = self.params.credit_class_fee.clone();
        let class_id = atomically(state, |tx| {
            let seq = tx.next_class_seq(&msg.credit_type_abbrev);
            let class_id = ids::format_class_id(&msg.credit_type_abbrev, seq);
            let class_key = tx.insert_class(Class {
                key: 0,
                id: class_id.clone(),
                admin: admin.clone(),
                credit_type_abbrev: msg.credit_type_abbrev.clone(),
                metadata: msg.metadata.clone(),
            })?;
            for issuer in &msg.issuers {
                tx.add_class_issuer(class_key, Address::new(issuer)?);
            }
            if !fee.is_empty() {
                bank.send(&admin, &fee_collector, &fee)?;
            }
            Ok(class_id)
        })?;

        info!(class_id, admin = %admin, "created credit class");
        Ok(MsgCreateClassResponse { class_id })
    }

    /// Create a project under a class. Only the class admin may create.
    ///
    /// # Errors
    /// `NotFound` for an unknown class; `Unauthorized` for a non-admin.
    pub fn create_project(
        &self,
        state: &mut State,
        msg: &MsgCreateProject,
    ) -> Result<MsgCreateProjectResponse> {
        msg.validate_basic()?;
        let admin = Address::new(&msg.admin)?;

        let class = state
            .class_by_id(&msg.class_id)
            .ok_or_else(|| EcoError::NotFound(format!("class {}", msg.class_id)))?;
        if class.admin != admin {
            return Err(EcoError::Unauthorized(format!(
                "{admin} is not the admin of class {}",
                msg.class_id
            )));
        }
        let class_key = class.key;

        let project_id = atomically(state, |tx| {
            let seq = tx.next_project_seq(class_key);
            let project_id = ids::format_project_id(&msg.class_id, seq);
            tx.insert_project(Project {
                key: 0,
                id: project_id.clone(),
                class_key,
                admin: admin.clone(),
                jurisdiction: msg.jurisdiction.clone(),
                reference_id: msg.reference_id.clone(),
                metadata: msg.metadata.clone(),
            })?;
            Ok(project_id)
        })?;

        info!(project_id, class_id = msg.class_id, "created project");
        Ok(MsgCreateProjectResponse { project_id })
    }
}
