/*!
# Lumen Render Core

Backend-agnostic core of the Lumen renderer.

The core never talks to a graphics API: backends implement the
`RenderBackend` and `GpuProgramCompiler` traits and receive fully built
state objects, pipelines and parameter tables.

## Architecture

- **State cache**: content-addressed blend/rasterizer/depth-stencil/sampler
  states, one backend object per distinct descriptor, each with a small
  dense id
- **Proxy/core objects**: every GPU object has a proxy on the simulation
  thread and a core object on the render thread, synchronized once per frame
  through immutable snapshots
- **Parameter layout**: a pipeline's `(set, slot)` bindings flattened into
  sequential indices per category
- **Parameter tables**: `GpuParams` binds blocks, textures, buffers and
  samplers and follows asynchronously loaded resources
- **Queries**: event/timer/occlusion queries with deferred deletion

Everything is reached through an explicit `RenderContext`.
*/

// Internal modules
mod error;
mod engine;
mod config;
mod context;
mod utils;
pub mod log;
pub mod device;
pub mod state;
pub mod core_thread;
pub mod resource;
pub mod program;
pub mod pipeline;
pub mod params;
pub mod query;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logger)
    pub use crate::engine::Engine;

    // Configuration and context
    pub use crate::config::RenderCoreConfig;
    pub use crate::context::RenderContext;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Backend contracts
    pub mod device {
        pub use crate::device::*;
    }

    // Render states and their cache
    pub mod state {
        pub use crate::state::*;
    }

    // Proxy/core synchronization
    pub mod core {
        pub use crate::core_thread::*;
    }

    // Asynchronously loaded resources
    pub mod resource {
        pub use crate::resource::*;
    }

    // Programs and reflection
    pub mod program {
        pub use crate::program::*;
    }

    // Pipelines and parameter layout
    pub mod pipeline {
        pub use crate::pipeline::*;
    }

    // Parameter tables
    pub mod params {
        pub use crate::params::*;
    }

    // GPU queries
    pub mod query {
        pub use crate::query::*;
    }
}

// Re-export math library at crate root
pub use glam;
