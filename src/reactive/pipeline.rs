//! The per-tick reactive decision pipeline.
//!
//! Sense → project → evaluate → decide → issue. One candidate is built per
//! PTG plus one "NOP" candidate that models keeping the previously sent
//! command alive; the motion optimizer then picks among them.

use crate::core::types::{Point2D, Pose2D, VelCmd};
use crate::error::{NavError, Result};
use crate::navigation::navigator::ReactiveNavigator;
use crate::navigation::target::NavTarget;
use crate::ptg::ClearanceDiagram;
use crate::reactive::scoring::{score_candidate, ScoreContext};
use crate::reactive::{CandidateMovement, NavLogRecord, PtgTickInfo};
use crate::robot::{ObstacleSnapshot, RobotInterface};
use crate::strategies::{Decision, HolonomicInput};

/// Inputs for building one movement candidate.
struct CandidateBuild {
    /// PTG that drives this candidate.
    ptg_index: usize,
    /// Slot in the per-tick arrays (`ptg_index`, or N for the NOP slot).
    slot: usize,
    /// Target relative to the candidate's PTG origin.
    rel_target: Pose2D,
    /// PTG evaluation origin expressed in the obstacle sense frame.
    rel_ptg_origin_wrt_sense: Pose2D,
    /// Whether this is the NOP continuation candidate.
    is_continuation: bool,
    /// Current robot pose relative to where the last command was sent
    /// (NOP candidate only).
    rel_cur_pose_wrt_last_cmd: Pose2D,
    tick_start: f64,
}

/// What the issue stage did, for the log record.
struct IssueOutcome {
    cmd: Option<VelCmd>,
    is_nop: bool,
}

impl<R: RobotInterface> ReactiveNavigator<R> {
    /// Execute one reactive decision. Called from the navigating state of
    /// the state machine, after pose refresh and arrival/stall checks.
    pub(crate) fn reactive_step(&mut self, params: &NavTarget) -> Result<()> {
        let n_ptgs = self.ptgs.len();
        let tick_start = self.robot.navigation_time();
        self.delays.note_tick_start(tick_start);

        // Target changes invalidate NOP continuation.
        let target_changed = self.last_target_pose != Some(params.target);
        self.last_target_pose = Some(params.target);

        if self.ptgs_must_reinit {
            for ptg in &mut self.ptgs {
                ptg.init_collision_grid();
            }
            self.ptgs_must_reinit = false;
        }

        let vel_local = self.cur_pose_vel.vel_local;
        for ptg in &mut self.ptgs {
            ptg.update_current_robot_vel(&vel_local);
        }

        let obstacles = match self.obstacle_source.sense(tick_start) {
            Ok(snapshot) => snapshot,
            Err(msg) => {
                self.do_emergency_stop("obstacle sensing failed, robot stopped");
                return Err(NavError::SenseFailure(msg));
            }
        };

        let offsets = self.delays.compute_offsets(
            self.config.reactive.use_delays_model,
            tick_start,
            obstacles.timestamp,
            self.cur_pose_vel.timestamp,
            &vel_local,
        );

        // Target relative to where the robot will be when the command
        // actually takes effect.
        let at_cmd_pose = self.cur_pose_vel.pose.compose(&offsets.rel_pose_vel_cmd);
        let rel_target = params.target.relative_to(&at_cmd_pose);

        self.per_ptg = vec![PtgTickInfo::default(); n_ptgs + 1];
        self.per_ptg_timestamp = Some(tick_start);

        let mut candidates = vec![CandidateMovement::default(); n_ptgs + 1];
        candidates[n_ptgs].invalidate(); // until a NOP candidate is built

        // Round 1: one regular candidate per PTG.
        for i in 0..n_ptgs {
            let build = CandidateBuild {
                ptg_index: i,
                slot: i,
                rel_target,
                rel_ptg_origin_wrt_sense: offsets.rel_pose_ptg_origin_wrt_sense,
                is_continuation: false,
                rel_cur_pose_wrt_last_cmd: Pose2D::identity(),
                tick_start,
            };
            self.build_candidate(&build, &obstacles, params, &mut candidates[i]);
        }

        // Round 2: the NOP continuation candidate.
        self.build_nop_candidate(
            params,
            target_changed,
            tick_start,
            &offsets.rel_pose_sense,
            &obstacles,
            &mut candidates[n_ptgs],
        );

        // Decide and issue.
        let decision = self.decider.decide(&candidates);
        let best = decision
            .best
            .filter(|&i| i < candidates.len() && candidates[i].is_viable());

        let outcome = self.issue_decision(best, n_ptgs, &candidates, tick_start);

        self.publish_log(
            &candidates,
            &decision,
            &outcome,
            rel_target,
            tick_start,
            offsets.sense_offset,
            offsets.cmd_offset,
        );

        outcome.map(|_| ())
    }

    /// Build one movement candidate (regular or NOP continuation).
    fn build_candidate(
        &mut self,
        build: &CandidateBuild,
        obstacles: &ObstacleSnapshot,
        params: &NavTarget,
        cm: &mut CandidateMovement,
    ) {
        let ptg_index = build.ptg_index;
        cm.ptg_index = Some(ptg_index);

        // Restricted-PTG requests exclude some families for this target.
        if !build.is_continuation
            && !params.restrict_ptg_indices.is_empty()
            && !params.restrict_ptg_indices.contains(&ptg_index)
        {
            log::debug!("candidate {}: PTG excluded by request", ptg_index);
            cm.invalidate();
            return;
        }

        let inverse = self.ptgs[ptg_index].inverse_map(build.rel_target.x, build.rel_target.y);
        let Some((target_k, target_d_norm)) = inverse else {
            log::debug!("candidate {}: target out of PTG domain", ptg_index);
            cm.invalidate();
            return;
        };

        let ptg = &self.ptgs[ptg_index];
        let ref_dist = ptg.ref_distance();
        let target_alpha = ptg.index_to_alpha(target_k);
        let tp_target = Point2D::new(
            target_alpha.cos() * target_d_norm,
            target_alpha.sin() * target_d_norm,
        );

        // Project workspace obstacles into TP-space, shifting them from the
        // sense frame into this candidate's PTG origin frame.
        let evaluate_clearance = self.config.reactive.evaluate_clearance;
        let mut tp_obstacles = ptg.init_tp_obstacles();
        let mut clearance = if evaluate_clearance {
            ptg.init_clearance()
        } else {
            ClearanceDiagram::default()
        };
        for p in &obstacles.points {
            let op = build.rel_ptg_origin_wrt_sense.inverse_transform_point(p);
            ptg.update_tp_obstacle(op.x, op.y, &mut tp_obstacles);
            if evaluate_clearance {
                ptg.update_clearance(op.x, op.y, &mut clearance);
            }
        }
        for d in tp_obstacles.iter_mut() {
            *d = (*d / ref_dist).clamp(0.0, 1.0);
        }

        if !build.is_continuation {
            // Holonomic direction/speed selection in TP-space.
            let holo = &mut self.holonomic[ptg_index];
            holo.enable_approach_target_slowdown(!params.intermediary_waypoint);
            let out = holo.navigate(&HolonomicInput {
                ptg: ptg.as_ref(),
                obstacles: &tp_obstacles,
                target: tp_target,
                clearance: evaluate_clearance.then_some(&clearance),
                max_obstacle_dist: 1.0,
                max_robot_speed: 1.0,
            });
            cm.direction = out.direction;
            cm.speed = out.speed as f64;

            // Safety ramp: never run at speed into a nearby obstacle. If the
            // family supports NOP continuation, discount the distance the
            // robot may still travel before the command gets reissued.
            let k_dir = ptg.alpha_to_index(cm.direction);
            let mut free = tp_obstacles.get(k_dir).copied().unwrap_or(0.0);
            if ptg.supports_nop_cmd() {
                let v = self.cur_pose_vel.vel_local.linear_speed();
                let d = v * ptg.max_nop_time(k_dir) as f32 / ref_dist;
                free = free.min((free - d).max(0.90));
            }
            let start = self.config.reactive.secure_distance_start;
            let end = self.config.reactive.secure_distance_end;
            let scale = if free >= end {
                1.0
            } else if free <= start {
                0.0
            } else {
                (free - start) / (end - start)
            };
            cm.speed *= scale as f64;
        } else {
            // NOP continuation: keep the previously commanded direction,
            // the scorer judges whether it is still trustworthy.
            cm.direction = ptg.index_to_alpha(self.last_sent_cmd.alpha_index);
            cm.speed = 1.0;
        }

        score_candidate(
            cm,
            &ScoreContext {
                ptg: ptg.as_ref(),
                ptg_idx: ptg_index,
                tp_obstacles: &tp_obstacles,
                clearance: &clearance,
                ws_target: build.rel_target,
                tp_target,
                is_continuation: build.is_continuation,
                rel_cur_pose_wrt_last_cmd: build.rel_cur_pose_wrt_last_cmd,
                cur_pose: self.cur_pose_vel.pose,
                last_sent: &self.last_sent_cmd,
                last_cmd: self.last_cmd.as_ref(),
                tick_start: build.tick_start,
                max_dist_timebased: self.config.reactive.max_dist_for_timebased_path_prediction,
                max_mismatch: self.config.reactive.max_distance_predicted_actual_path,
            },
        );
        cm.props.insert(
            "original_col_free_dist".to_string(),
            if build.is_continuation {
                self.last_sent_cmd.colfree_dist_move_k as f64
            } else {
                0.0
            },
        );

        self.per_ptg[build.slot] = PtgTickInfo {
            valid: true,
            target_k,
            target_alpha,
            target_d_norm,
            tp_target,
            tp_obstacles,
            clearance,
        };
    }

    /// Build the "keep the previous command" candidate in slot N.
    fn build_nop_candidate(
        &mut self,
        params: &NavTarget,
        target_changed: bool,
        tick_start: f64,
        rel_pose_sense: &Pose2D,
        obstacles: &ObstacleSnapshot,
        cm: &mut CandidateMovement,
    ) {
        if !self.last_sent_cmd.is_valid() || target_changed {
            return; // slot stays inviable
        }
        let prev_idx = self.last_sent_cmd.ptg_index;
        if prev_idx >= self.ptgs.len() || !self.ptgs[prev_idx].supports_nop_cmd() {
            return;
        }
        let elapsed = tick_start - self.last_sent_cmd.time_sent;
        let max_nop = self.ptgs[prev_idx].max_nop_time(self.last_sent_cmd.alpha_index);
        if elapsed >= max_nop {
            log::debug!(
                "PTG continuation not allowed: previous command timed out ({:.3} s > {:.3} s)",
                elapsed,
                max_nop
            );
            return;
        }

        // Recover the robot pose at the instant the previous command took
        // effect (send time plus the mean duration of the send call).
        let effect_time = self.last_sent_cmd.time_sent + self.delays.t_change.output();
        let Some(pose_at_send) = self.pose_history.interpolate(effect_time) else {
            log::debug!("PTG continuation not allowed: cannot interpolate pose at send time");
            return;
        };

        let vel_at_send = self.last_sent_cmd.pose_vel.vel_local;
        self.ptgs[prev_idx].update_current_robot_vel(&vel_at_send);

        let rel_target_nop = params.target.relative_to(&pose_at_send);
        let sense_pose = self.cur_pose_vel.pose.compose(rel_pose_sense);
        let rel_ptg_origin_nop = pose_at_send.relative_to(&sense_pose);
        let rel_cur_pose = self.cur_pose_vel.pose.relative_to(&pose_at_send);

        let slot = self.ptgs.len();
        let build = CandidateBuild {
            ptg_index: prev_idx,
            slot,
            rel_target: rel_target_nop,
            rel_ptg_origin_wrt_sense: rel_ptg_origin_nop,
            is_continuation: true,
            rel_cur_pose_wrt_last_cmd: rel_cur_pose,
            tick_start,
        };
        self.build_candidate(&build, obstacles, params, cm);
    }

    /// Turn the optimizer's choice into a robot command.
    fn issue_decision(
        &mut self,
        best: Option<usize>,
        n_ptgs: usize,
        candidates: &[CandidateMovement],
        tick_start: f64,
    ) -> Result<IssueOutcome> {
        let best_is_nop = best == Some(n_ptgs);

        if best_is_nop {
            if !self.robot.change_speeds_nop() {
                self.do_emergency_stop("failed to send NOP command, robot stopped");
                return Err(NavError::CommandSendFailure);
            }
            return Ok(IssueOutcome {
                cmd: None,
                is_nop: true,
            });
        }

        let Some(bi) = best else {
            log::debug!("no viable motion candidate, stopping robot");
            self.stop_robot(true);
            self.last_sent_cmd.reset();
            return Ok(IssueOutcome {
                cmd: None,
                is_nop: false,
            });
        };

        let cm = &candidates[bi];
        if cm.speed <= 0.0 {
            log::debug!("best velocity command is stop (no way found), stopping robot");
            self.stop_robot(true);
            self.last_sent_cmd.reset();
            let stop_cmd = self.robot.emergency_stop_cmd();
            self.last_cmd = Some(stop_cmd);
            return Ok(IssueOutcome {
                cmd: Some(stop_cmd),
                is_nop: false,
            });
        }

        let (mut cmd, alpha_index) = {
            let ptg = &self.ptgs[bi];
            let k = ptg.alpha_to_index(cm.direction);
            (ptg.direction_to_motion_command(k), k)
        };
        cmd.scale(cm.speed as f32);
        let mut speed_scale = cm.speed;

        // User speed limits and first-order blending against the last
        // issued command.
        let beta = self
            .delays
            .speed_filter_beta(self.config.reactive.speedfilter_tau);
        let last = self.last_cmd.unwrap_or(VelCmd::STOP);
        speed_scale *= cmd.filter_and_limit(
            &last,
            beta,
            &self.config.reactive.robot_absolute_speed_limits,
        ) as f64;

        if cmd.is_stop() {
            log::debug!("filtered velocity command is stop, stopping robot");
            self.stop_robot(true);
            self.last_sent_cmd.reset();
            self.last_cmd = Some(cmd);
            return Ok(IssueOutcome {
                cmd: Some(cmd),
                is_nop: false,
            });
        }

        let t_before = self.robot.navigation_time();
        if !self.robot.change_speeds(&cmd) {
            self.do_emergency_stop("failed to send velocity command, robot stopped");
            return Err(NavError::CommandSendFailure);
        }
        let t_after = self.robot.navigation_time();

        self.last_cmd = Some(cmd);
        let info = &self.per_ptg[bi];
        self.last_sent_cmd = crate::reactive::SentVelCmd {
            ptg_index: bi,
            alpha_index,
            tp_target_k: info.target_k,
            colfree_dist_move_k: info.tp_obstacles.get(alpha_index).copied().unwrap_or(0.0),
            time_sent: t_before,
            speed_scale,
            pose_vel: self.cur_pose_vel,
            cmd,
        };

        self.delays.t_send.filter(t_before - tick_start);
        self.delays.t_change.filter(t_after - t_before);

        log::debug!(
            "CMD: ({:.3}, {:.3}, {:.3}) speed_scale={:.3} PTG#{} k={}",
            cmd.linear,
            cmd.lateral,
            cmd.angular,
            speed_scale,
            bi,
            alpha_index
        );

        Ok(IssueOutcome {
            cmd: Some(cmd),
            is_nop: false,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn publish_log(
        &mut self,
        candidates: &[CandidateMovement],
        decision: &Decision,
        outcome: &Result<IssueOutcome>,
        rel_target: Pose2D,
        tick_start: f64,
        sense_offset: f64,
        cmd_offset: f64,
    ) {
        let mut rec = NavLogRecord {
            robot_pose: self.cur_pose_vel.pose,
            vel_local: self.cur_pose_vel.vel_local,
            rel_target,
            selected: decision
                .best
                .filter(|&i| i < candidates.len() && candidates[i].is_viable()),
            selected_is_nop: false,
            cmd: None,
            evaluations: decision.evaluations.clone(),
            values: Default::default(),
            timestamp: tick_start,
        };
        if let Ok(out) = outcome {
            rec.selected_is_nop = out.is_nop;
            rec.cmd = out.cmd;
        }
        rec.values
            .insert("period".to_string(), self.delays.mean_period.output());
        rec.values
            .insert("timoff_pose2sense".to_string(), sense_offset);
        rec.values
            .insert("timoff_pose2VelCmd".to_string(), cmd_offset);
        rec.values
            .insert("timoff_sendVelCmd_avr".to_string(), self.delays.t_send.output());
        rec.values
            .insert("tim_changeSpeed_avr".to_string(), self.delays.t_change.output());

        *self.last_log.lock() = Some(rec);
    }
}
