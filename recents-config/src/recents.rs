use knuffel::errors::DecodeError;

/// Upper bound accepted for `max-task-count`.
pub const TASK_COUNT_LIMIT: u8 = 32;

#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq)]
pub struct Recents {
    #[knuffel(child, unwrap(argument), default = TaskCount::default())]
    pub max_task_count: TaskCount,
    #[knuffel(child, unwrap(argument), default = 1)]
    pub preload_pages: u8,
}

impl Default for Recents {
    fn default() -> Self {
        Self {
            max_task_count: TaskCount::default(),
            preload_pages: 1,
        }
    }
}

/// Maximum number of task tiles alive at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCount(pub u8);

impl Default for TaskCount {
    fn default() -> Self {
        Self(8)
    }
}

impl TaskCount {
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl<S: knuffel::traits::ErrorSpan> knuffel::DecodeScalar<S> for TaskCount {
    fn type_check(
        type_name: &Option<knuffel::span::Spanned<knuffel::ast::TypeName, S>>,
        ctx: &mut knuffel::decode::Context<S>,
    ) {
        if let Some(type_name) = &type_name {
            ctx.emit_error(DecodeError::unexpected(
                type_name,
                "type name",
                "no type name expected for this node",
            ));
        }
    }

    fn raw_decode(
        val: &knuffel::span::Spanned<knuffel::ast::Literal, S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<TaskCount, DecodeError<S>> {
        match &**val {
            knuffel::ast::Literal::Int(ref value) => match value.try_into() {
                Ok(v) => {
                    if (1..=TASK_COUNT_LIMIT).contains(&v) {
                        Ok(TaskCount(v))
                    } else {
                        ctx.emit_error(DecodeError::conversion(
                            val,
                            format!("max-task-count must be between 1 and {TASK_COUNT_LIMIT}"),
                        ));
                        Ok(TaskCount::default())
                    }
                }
                Err(e) => {
                    ctx.emit_error(DecodeError::conversion(val, e));
                    Ok(TaskCount::default())
                }
            },
            _ => {
                ctx.emit_error(DecodeError::unsupported(
                    val,
                    "max-task-count must be an integer",
                ));
                Ok(TaskCount::default())
            }
        }
    }
}
