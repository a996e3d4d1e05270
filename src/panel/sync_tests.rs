#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use crate::panel::camera::{Axis, CameraPose, PoseField, Steer};
    use crate::panel::client::RenderRequest;
    use crate::panel::coordinator::InputCoordinator;

    const STEP: f64 = 0.5;
    const THROTTLE_MS: u64 = 100;
    const DEBOUNCE_MS: u64 = 500;

    fn coordinator() -> (InputCoordinator, mpsc::Receiver<RenderRequest>) {
        let (tx, rx) = mpsc::channel();
        let coordinator = InputCoordinator::new(
            STEP,
            Duration::from_millis(THROTTLE_MS),
            Duration::from_millis(DEBOUNCE_MS),
            tx,
        );
        (coordinator, rx)
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    fn forward() -> Steer {
        // `w`: eye Z+.
        Steer {
            field: PoseField::Eye(Axis::Z),
            sign: 1.0,
        }
    }

    fn sent(rx: &mpsc::Receiver<RenderRequest>) -> Vec<RenderRequest> {
        rx.try_iter().collect()
    }

    #[test]
    fn key_downs_inside_the_throttle_window_are_dropped_entirely() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.key_down(forward(), at(base, 0));
        let after_first = c.pose();

        // 50 ms later: ignored, no pose change, no request ever.
        c.key_down(forward(), at(base, 50));
        assert_eq!(c.pose(), after_first);

        c.tick(at(base, 2_000));
        assert_eq!(sent(&rx).len(), 1);
    }

    #[test]
    fn burst_coalesces_into_one_quick_request_with_the_final_pose() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        // Five accepted presses, each re-arming the debounce.
        for i in 0..5 {
            c.key_down(forward(), at(base, i * 110));
        }

        // Last press at t=440; quiet until t=939 keeps the timer pending.
        c.tick(at(base, 939));
        assert!(sent(&rx).is_empty());

        c.tick(at(base, 940));
        let requests = sent(&rx);
        assert_eq!(requests.len(), 1);
        assert!(requests[0].quick_render);
        assert_eq!(
            requests[0].pose.eye.z,
            CameraPose::default().eye.z + 5.0 * STEP
        );
    }

    #[test]
    fn key_up_flushes_the_pending_quick_then_requests_the_settle_render() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.key_down(forward(), at(base, 0));
        c.key_up(at(base, 50));

        let requests = sent(&rx);
        assert_eq!(requests.len(), 2);

        let expected_z = CameraPose::default().eye.z + STEP;
        assert!(requests[0].quick_render);
        assert_eq!(requests[0].pose.eye.z, expected_z);
        assert!(!requests[1].quick_render);
        assert_eq!(requests[1].pose, requests[0].pose);

        // Nothing left to fire later.
        c.tick(at(base, 2_000));
        assert!(sent(&rx).is_empty());
    }

    #[test]
    fn key_up_without_a_pending_quick_sends_only_the_settle_request() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.key_up(at(base, 0));

        let requests = sent(&rx);
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].quick_render);
        assert_eq!(requests[0].pose, CameraPose::default());
    }

    #[test]
    fn field_edit_commits_after_the_quiet_period() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.edit_field(PoseField::Eye(Axis::X), 3.5, at(base, 0));

        // Not committed yet: pose untouched, nothing sent.
        c.tick(at(base, 499));
        assert_eq!(c.pose(), CameraPose::default());
        assert!(sent(&rx).is_empty());

        c.tick(at(base, 500));
        assert_eq!(c.pose().eye.x, 3.5);

        let requests = sent(&rx);
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].quick_render);
        assert_eq!(requests[0].pose.eye.x, 3.5);
        // The rest of the pose is merged from last-known values.
        assert_eq!(requests[0].pose.eye.y, CameraPose::default().eye.y);
        assert_eq!(requests[0].pose.eye.z, CameraPose::default().eye.z);
        assert_eq!(requests[0].pose.look_at, CameraPose::default().look_at);
    }

    #[test]
    fn re_editing_a_field_resets_its_debounce_and_keeps_the_last_value() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.edit_field(PoseField::LookAt(Axis::Y), 1.0, at(base, 0));
        c.edit_field(PoseField::LookAt(Axis::Y), 2.0, at(base, 400));

        c.tick(at(base, 500));
        assert!(sent(&rx).is_empty());

        c.tick(at(base, 900));
        let requests = sent(&rx);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].pose.look_at.y, 2.0);
    }

    #[test]
    fn distinct_fields_debounce_independently() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.edit_field(PoseField::Eye(Axis::X), 1.0, at(base, 0));
        c.edit_field(PoseField::Eye(Axis::Y), 2.0, at(base, 200));

        c.tick(at(base, 500));
        let first: Vec<_> = sent(&rx);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].pose.eye.x, 1.0);

        c.tick(at(base, 700));
        let second: Vec<_> = sent(&rx);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].pose.eye.y, 2.0);
        // The second commit merges the first one's value.
        assert_eq!(second[0].pose.eye.x, 1.0);
    }

    #[test]
    fn cancel_pending_drops_scheduled_updates() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.key_down(forward(), at(base, 0));
        c.edit_field(PoseField::Eye(Axis::X), 9.0, at(base, 10));
        c.cancel_pending();

        c.tick(at(base, 5_000));
        assert!(sent(&rx).is_empty());
        // The key press had already been applied locally; cancel only stops
        // the outgoing request.
        assert_eq!(c.pose().eye.z, CameraPose::default().eye.z + STEP);
    }

    #[test]
    fn keyboard_and_field_edits_merge_into_one_pose() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.key_down(forward(), at(base, 0));
        c.edit_field(PoseField::LookAt(Axis::X), 4.0, at(base, 10));
        c.key_up(at(base, 50));

        // Quick flush + settle carry the nudged eye but the not-yet-committed
        // look-at stays at its last-known value.
        let requests = sent(&rx);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].pose.look_at.x, CameraPose::default().look_at.x);

        c.tick(at(base, 510));
        let commits = sent(&rx);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].pose.look_at.x, 4.0);
        assert_eq!(
            commits[0].pose.eye.z,
            CameraPose::default().eye.z + STEP
        );
    }

    #[test]
    fn step_unit_scales_key_deltas() {
        let (mut c, rx) = coordinator();
        let base = Instant::now();

        c.set_step(0.25);
        c.key_down(forward(), at(base, 0));
        c.key_up(at(base, 10));

        let requests = sent(&rx);
        assert_eq!(
            requests[1].pose.eye.z,
            CameraPose::default().eye.z + 0.25
        );
    }
}
