// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stage snapshots (recursive through sub-stages).

use crate::ids::{StageId, TaskId};
use crate::plan::PlanFragment;
use crate::scalar::StageState;
use crate::task::TaskInfo;
use presto_state_decode::{Decode, DecodeError, Decoder, ValidationError};
use serde::Serialize;
use serde_json::Value;

/// One stage of a distributed query and the stages feeding it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInfo {
    stage_id: StageId,
    state: StageState,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<PlanFragment>,
    tasks: Vec<TaskInfo>,
    sub_stages: Vec<StageInfo>,
}

impl StageInfo {
    /// Assemble a stage. Every task must belong to this stage.
    pub fn new(
        stage_id: StageId,
        state: StageState,
        plan: Option<PlanFragment>,
        tasks: Vec<TaskInfo>,
        sub_stages: Vec<Self>,
    ) -> Result<Self, ValidationError> {
        if let Some(stray) = tasks
            .iter()
            .map(|t| t.task_status().task_id())
            .find(|id| id.stage_id() != &stage_id)
        {
            return Err(ValidationError::invalid(
                "tasks",
                format!("task {stray} does not belong to stage {stage_id}"),
            ));
        }
        Ok(Self {
            stage_id,
            state,
            plan,
            tasks,
            sub_stages,
        })
    }

    /// Stage identifier.
    pub fn stage_id(&self) -> &StageId {
        &self.stage_id
    }

    /// Lifecycle state.
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Fragment executed by this stage, once planned.
    pub fn plan(&self) -> Option<&PlanFragment> {
        self.plan.as_ref()
    }

    /// Tasks of this stage.
    pub fn tasks(&self) -> &[TaskInfo] {
        &self.tasks
    }

    /// Stages feeding this one.
    pub fn sub_stages(&self) -> &[Self] {
        &self.sub_stages
    }

    /// This stage and every descendant, depth-first pre-order.
    pub fn all_stages(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(stage) = stack.pop() {
            out.push(stage);
            stack.extend(stage.sub_stages.iter().rev());
        }
        out
    }

    /// Task lookup across the whole stage tree.
    pub fn find_task(&self, id: &TaskId) -> Option<&TaskInfo> {
        self.all_stages()
            .into_iter()
            .flat_map(|s| s.tasks.iter())
            .find(|t| t.task_status().task_id() == id)
    }
}

impl Decode for StageInfo {
    fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let obj = cx.object(value)?;
        let stage_id = cx.required(obj, "stageId")?;
        let state = cx.required(obj, "state")?;
        let plan = cx.optional(obj, "plan")?;
        let tasks = cx.required(obj, "tasks")?;
        let sub_stages = cx.required(obj, "subStages")?;
        cx.validated(Self::new(stage_id, state, plan, tasks, sub_stages))
    }
}
