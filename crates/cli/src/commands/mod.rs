pub mod simulate;
pub mod suggest;
pub mod validate;

pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self { exit_code: 1, output: output.into() }
    }
}
