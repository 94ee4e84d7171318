use super::*;
use std::time::Duration;
use crate::color::{ColorCode, IdentifierAllocator};
use crate::fragment::FragmentBoxes;
use crate::probe::instance_batch::{InstanceBatch, RenderGroup};
use crate::probe::mock_probe_renderer::{MockCall, MockProbeRenderer};
use glam::Mat4;

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Helpers
// ============================================================================

struct Fixture {
    renderer: MockProbeRenderer,
    scene: ProbeScene,
    transparent: Arc<dyn RenderableGroup>,
    decoder: PixelDecoder,
}

/// Opaque "F1" (0-0-1), "F2" (0-0-2); transparent "F3" (0-0-3)
fn fixture() -> Fixture {
    let mut boxes = FragmentBoxes::new();
    boxes.push_opaque(1, Mat4::IDENTITY, "F1");
    boxes.push_opaque(2, Mat4::IDENTITY, "F2");
    boxes.push_transparent(3, Mat4::IDENTITY, "F3");

    let mut alloc = IdentifierAllocator::new();
    let opaque = InstanceBatch::build(RenderGroup::Opaque, &boxes.opaque, &boxes.instance_to_fragment, &mut alloc).unwrap();
    let transparent = InstanceBatch::build(RenderGroup::Transparent, &boxes.transparent, &boxes.instance_to_fragment, &mut alloc).unwrap();

    let mut renderer = MockProbeRenderer::new();
    let mut scene = ProbeScene::new();
    scene.add(renderer.create_group(&opaque).unwrap());
    let transparent = renderer.create_group(&transparent).unwrap();
    renderer.calls.clear();

    Fixture { renderer, scene, transparent, decoder: PixelDecoder::new().unwrap() }
}

fn codes(ids: &[u8]) -> Vec<ColorCode> {
    ids.iter().map(|b| ColorCode::new(0, 0, *b)).collect()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_rejects_empty_target() {
    assert!(matches!(VisibilityRenderPass::new(0, 512), Err(Error::InvalidResource(_))));
    assert!(matches!(VisibilityRenderPass::new(512, 0), Err(Error::InvalidResource(_))));
}

#[test]
fn test_new_defaults() {
    let pass = VisibilityRenderPass::new(64, 32).unwrap();
    assert_eq!(pass.buffer_size(), 64 * 32 * 4);
    assert_eq!(pass.target(), ProbeTarget::Offscreen { width: 64, height: 32 });
    assert_eq!(pass.stage(), PassStage::Idle);
    assert!(!pass.render_debug_frame());
}

// ============================================================================
// Two-pass protocol
// ============================================================================

#[test]
fn test_cycle_renders_opaque_then_transparent() {
    let mut f = fixture();
    let mut pass = VisibilityRenderPass::new(8, 8).unwrap();

    pass.run_cycle(&mut f.renderer, &mut f.scene, Some(&f.transparent), &mut f.decoder, 0, 1).unwrap();

    let target = ProbeTarget::Offscreen { width: 8, height: 8 };
    assert_eq!(f.renderer.calls, vec![
        MockCall::Render { target, groups: vec![RenderGroup::Opaque] },
        MockCall::ReadPixels { width: 8, height: 8 },
        MockCall::Render { target, groups: vec![RenderGroup::Opaque, RenderGroup::Transparent] },
        MockCall::ReadPixels { width: 8, height: 8 },
    ]);
    assert_eq!(pass.stage(), PassStage::AwaitingTransparentDecode);
}

#[test]
fn test_transparent_group_removed_after_cycle() {
    let mut f = fixture();
    let mut pass = VisibilityRenderPass::new(8, 8).unwrap();

    pass.run_cycle(&mut f.renderer, &mut f.scene, Some(&f.transparent), &mut f.decoder, 0, 1).unwrap();

    assert_eq!(f.scene.len(), 1);
    assert!(!f.scene.has_group(RenderGroup::Transparent));
}

#[test]
fn test_cycle_submits_both_buffers_in_order() {
    let mut f = fixture();
    f.renderer.set_visible(&codes(&[1, 2, 3]));
    let mut pass = VisibilityRenderPass::new(8, 8).unwrap();

    pass.run_cycle(&mut f.renderer, &mut f.scene, Some(&f.transparent), &mut f.decoder, 7, 3).unwrap();

    let opaque = f.decoder.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(opaque.ticket, DecodeTicket { generation: 7, cycle: 3, pass: PassKind::Opaque });
    assert_eq!(opaque.colors, vec![ColorCode::new(0, 0, 1), ColorCode::new(0, 0, 2), ColorCode::BACKGROUND]);

    let transparent = f.decoder.recv_timeout(WAIT).unwrap().unwrap();
    assert_eq!(transparent.ticket.pass, PassKind::Transparent);
    assert!(transparent.colors.contains(&ColorCode::new(0, 0, 3)));
    assert_eq!(transparent.pixels.len(), pass.buffer_size());
}

#[test]
fn test_cycle_without_transparent_group() {
    let mut f = fixture();
    let mut pass = VisibilityRenderPass::new(4, 4).unwrap();

    pass.run_cycle(&mut f.renderer, &mut f.scene, None, &mut f.decoder, 0, 1).unwrap();

    assert_eq!(f.renderer.render_count(), 2);
    assert_eq!(f.decoder.in_flight(), 2);
}

#[test]
fn test_debug_frame_renders_to_screen() {
    let mut f = fixture();
    let mut pass = VisibilityRenderPass::new(4, 4).unwrap();
    pass.set_render_debug_frame(true);

    pass.run_cycle(&mut f.renderer, &mut f.scene, Some(&f.transparent), &mut f.decoder, 0, 1).unwrap();

    assert_eq!(f.renderer.render_count(), 3);
    assert_eq!(
        f.renderer.calls.last(),
        Some(&MockCall::Render {
            target: ProbeTarget::Screen,
            groups: vec![RenderGroup::Opaque, RenderGroup::Transparent],
        })
    );
    // Debug frame does not add a decode request
    assert_eq!(f.decoder.in_flight(), 2);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_render_failure_leaves_scene_clean() {
    let mut f = fixture();
    f.renderer.fail_render = true;
    let mut pass = VisibilityRenderPass::new(4, 4).unwrap();

    let result = pass.run_cycle(&mut f.renderer, &mut f.scene, Some(&f.transparent), &mut f.decoder, 0, 1);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(f.scene.len(), 1);
    assert_eq!(f.decoder.in_flight(), 0);
    assert_eq!(pass.stage(), PassStage::Idle);
}

#[test]
fn test_read_failure_keeps_buffer() {
    let mut f = fixture();
    f.renderer.fail_read = true;
    let mut pass = VisibilityRenderPass::new(4, 4).unwrap();

    assert!(pass.run_cycle(&mut f.renderer, &mut f.scene, Some(&f.transparent), &mut f.decoder, 0, 1).is_err());
    assert_eq!(pass.spare_buffer_count(), 1);
    assert_eq!(f.decoder.in_flight(), 0);
}

// ============================================================================
// Buffer reuse
// ============================================================================

#[test]
fn test_recycled_buffers_are_reused() {
    let mut f = fixture();
    let mut pass = VisibilityRenderPass::new(4, 4).unwrap();

    pass.run_cycle(&mut f.renderer, &mut f.scene, Some(&f.transparent), &mut f.decoder, 0, 1).unwrap();
    for _ in 0..2 {
        let result = f.decoder.recv_timeout(WAIT).unwrap().unwrap();
        pass.recycle(result.pixels);
    }
    assert_eq!(pass.spare_buffer_count(), 2);

    pass.finish_cycle();
    pass.run_cycle(&mut f.renderer, &mut f.scene, Some(&f.transparent), &mut f.decoder, 0, 2).unwrap();
    assert_eq!(pass.spare_buffer_count(), 0);
}

#[test]
fn test_recycle_drops_wrong_size_and_surplus() {
    let mut pass = VisibilityRenderPass::new(4, 4).unwrap();
    pass.recycle(vec![0; 3]);
    assert_eq!(pass.spare_buffer_count(), 0);

    for _ in 0..5 {
        pass.recycle(vec![0; pass.buffer_size()]);
    }
    assert_eq!(pass.spare_buffer_count(), 2);
}
