// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
pub mod builtin;
pub mod registry;
pub mod tool;

pub use registry::{ToolRegistry, ToolSchema};
pub use tool::{Tool, ToolCall, ToolContext, ToolOutput};

pub use builtin::schedule_appointment::ScheduleAppointmentTool;
pub use builtin::search_knowledge_base::SearchKnowledgeBaseTool;
pub use builtin::transfer_to_human::TransferToHumanTool;
pub use builtin::update_user_info::UpdateUserInfoTool;
