// File: src/config.rs
//
// Runtime-tunable constants. Defaults match the reference
// implementation's fixed values so that the VM's and compiler's
// documented limits are not magic numbers scattered through the code.

#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub max_call_frames: usize,
    pub max_pool_size: usize,
    pub max_jump: usize,
    pub stack_reserve: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_frames: 256,
            max_pool_size: crate::bytecode::MAX_POOL_SIZE,
            max_jump: crate::bytecode::MAX_JUMP,
            stack_reserve: 256,
        }
    }
}
