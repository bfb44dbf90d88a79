//! Integration tests for the render state cache
//!
//! Equal descriptors resolve to one shared backend object, dense ids stay
//! within their budget, and the cache is safe to hit from many threads.
//!
//! Run with: cargo test --test state_cache_integration_tests

mod test_utils;

use std::sync::Arc;
use std::thread;
use lumen_render_core::lumen::{Error, RenderCoreConfig};
use lumen_render_core::lumen::state::{
    BlendStateDesc, CullMode, RasterizerStateDesc, SamplerStateDesc, StateKind,
};
use lumen_render_null::NullCommand;
use test_utils::null_context;

// ============================================================================
// DEDUPLICATION
// ============================================================================

#[test]
fn test_integration_equal_descriptors_share_one_object() {
    let (null, context, _core) = null_context(RenderCoreConfig::default());
    let states = context.render_states();

    let a = states.rasterizer_state(&RasterizerStateDesc { cull_mode: CullMode::Front, ..Default::default() }).unwrap();
    let b = states.rasterizer_state(&RasterizerStateDesc { cull_mode: CullMode::Front, ..Default::default() }).unwrap();
    let c = states.rasterizer_state(&RasterizerStateDesc { cull_mode: CullMode::None, ..Default::default() }).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_ne!(a.id(), c.id());
    let created = null.lock().unwrap().commands().iter()
        .filter(|cmd| matches!(cmd, NullCommand::CreateState { kind: StateKind::Rasterizer, .. }))
        .count();
    assert_eq!(created, 2);
}

#[test]
fn test_integration_concurrent_requests_dedup() {
    let (null, context, _core) = null_context(RenderCoreConfig::default());
    let states = context.render_states().clone();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let states = states.clone();
            thread::spawn(move || {
                let desc = if i % 2 == 0 { SamplerStateDesc::linear_clamp() } else { SamplerStateDesc::nearest_wrap() };
                (i % 2, states.sampler_state(&desc).unwrap())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for (group, state) in &results {
        let first = results.iter().find(|(g, _)| g == group).map(|(_, s)| s).unwrap();
        assert!(Arc::ptr_eq(state, first));
    }
    let stats = states.sampler_cache().stats();
    assert_eq!(stats.live, 2);
    let created = null.lock().unwrap().stats().states_created;
    assert!(created >= 2);
}

// ============================================================================
// DENSE IDS
// ============================================================================

#[test]
fn test_integration_ids_exhausted() {
    let (_null, context, _core) = null_context(RenderCoreConfig::default().with_max_state_ids(2));
    let states = context.render_states();

    let _a = states.blend_state(&BlendStateDesc::default()).unwrap();
    let _b = states.blend_state(&BlendStateDesc::alpha_blended()).unwrap();
    let err = states.blend_state(&BlendStateDesc { alpha_to_coverage: true, ..Default::default() });

    assert_eq!(err.unwrap_err(), Error::StateIdsExhausted { kind: "blend", max: 2 });
}

#[test]
fn test_integration_ids_fit_in_ten_bits() {
    let (_null, context, _core) = null_context(RenderCoreConfig::default());
    let states = context.render_states();

    let held: Vec<_> = (0..64)
        .map(|i| {
            let desc = SamplerStateDesc { mip_bias: i as f32, ..Default::default() };
            states.sampler_state(&desc).unwrap()
        })
        .collect();

    assert!(held.iter().all(|s| s.id() < 1024));
    let mut ids: Vec<u32> = held.iter().map(|s| s.id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 64);
}

#[test]
fn test_integration_released_state_recreated() {
    let (null, context, _core) = null_context(RenderCoreConfig::default());
    let states = context.render_states();
    let desc = SamplerStateDesc { max_anisotropy: 8, ..Default::default() };

    let first = states.sampler_state(&desc).unwrap();
    let first_id = first.id();
    drop(first);
    let second = states.sampler_state(&desc).unwrap();

    assert_eq!(states.sampler_cache().stats().evictions, 1);
    assert_ne!(second.id(), first_id);
    assert_eq!(null.lock().unwrap().stats().states_created, 2);
}

// ============================================================================
// CLEAR
// ============================================================================

#[test]
fn test_integration_clear_keeps_held_states_valid() {
    let (_null, context, _core) = null_context(RenderCoreConfig::default());
    let states = context.render_states();

    let held = states.default_sampler_state().unwrap();
    let held_id = held.id();
    states.sampler_cache().clear();

    // Still usable, no longer found, ids keep counting
    assert_eq!(held.id(), held_id);
    assert!(states.sampler_cache().find(&SamplerStateDesc::default()).is_none());
    let other = states.sampler_state(&SamplerStateDesc::linear_clamp()).unwrap();
    assert!(other.id() > held_id);
}

#[test]
fn test_integration_clear_without_live_states_resets_ids() {
    let (_null, context, _core) = null_context(RenderCoreConfig::default());
    let states = context.render_states();

    drop(states.sampler_state(&SamplerStateDesc::linear_clamp()).unwrap());
    drop(states.sampler_state(&SamplerStateDesc::nearest_wrap()).unwrap());
    assert_eq!(states.sampler_cache().next_id(), 2);

    states.sampler_cache().clear();

    assert_eq!(states.sampler_cache().next_id(), 0);
    assert_eq!(states.sampler_state(&SamplerStateDesc::linear_clamp()).unwrap().id(), 0);
}
