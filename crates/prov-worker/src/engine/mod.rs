mod workflow;

pub use workflow::{
    ProvisioningInput, ProvisioningOutput, ProvisioningWorkflow, STATE_SNAPSHOT_ACTIVITY_ID,
    STATE_SNAPSHOT_ACTIVITY_TYPE, STEP_CONTROL_SIGNAL,
};
