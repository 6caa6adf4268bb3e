/// Bounds a task run to a fixed number of iterations.
pub struct LoopController {
    max_iterations: u32,
    iteration: u32,
}

impl LoopController {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            iteration: 0,
        }
    }

    /// Start the next iteration, returning its 1-based number, or `None`
    /// once the bound is reached.
    pub fn advance(&mut self) -> Option<u32> {
        if self.should_stop() {
            return None;
        }
        self.iteration += 1;
        Some(self.iteration)
    }

    pub fn should_stop(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }
}
