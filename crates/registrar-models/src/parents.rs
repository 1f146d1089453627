//! Parent to student links.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{StudentId, UserId};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LinkChildDto {
    pub student_id: StudentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParentLink {
    pub parent_id: UserId,
    pub student_id: StudentId,
}
