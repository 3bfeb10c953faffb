//! Diesel schema for task persistence.

diesel::table! {
    /// Task records, including tasks in the recycle bin.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional long description.
        description -> Nullable<Text>,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Workflow status; the recycle bin is tracked by `deleted_at`.
        #[max_length = 32]
        status -> Varchar,
        /// Task priority.
        #[max_length = 16]
        priority -> Varchar,
        /// Assignment shape.
        #[max_length = 32]
        kind -> Varchar,
        /// Province scope for province-department tasks.
        province_id -> Nullable<Uuid>,
        /// Creating user.
        created_by -> Uuid,
        /// Whether the task was delegated, or is a delegated child.
        is_delegated -> Bool,
        /// Delegating user.
        delegated_by -> Nullable<Uuid>,
        /// Delegation parent.
        delegated_from -> Nullable<Uuid>,
        /// Free-text delegation note.
        delegation_reason -> Nullable<Text>,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Cancellation timestamp.
        cancelled_at -> Nullable<Timestamptz>,
        /// Cancelling user.
        cancelled_by -> Nullable<Uuid>,
        /// Cancellation reason.
        cancellation_reason -> Nullable<Text>,
        /// Recycle-bin entry timestamp.
        deleted_at -> Nullable<Timestamptz>,
        /// Deleting user.
        deleted_by -> Nullable<Uuid>,
        /// Deletion reason.
        deletion_reason -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Direct user assignees, including the owner of a personal task.
    task_user_assignees (task_id, user_id) {
        /// Assigned task.
        task_id -> Uuid,
        /// Assigned user.
        user_id -> Uuid,
    }
}

diesel::table! {
    /// Department assignees.
    task_department_assignees (task_id, department_id) {
        /// Assigned task.
        task_id -> Uuid,
        /// Assigned department.
        department_id -> Uuid,
    }
}

diesel::joinable!(task_user_assignees -> tasks (task_id));
diesel::joinable!(task_department_assignees -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(tasks, task_user_assignees, task_department_assignees);
