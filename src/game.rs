use crate::assets;
use crate::config;
use crate::render::Renderer;
use crate::stats::{LogStatsIo, ResultType, TrackResult, TrackStats};
use crate::ui::atlas::{Skin, TextureAtlas};
use crate::ui::markup::{self, MarkupError};
use crate::ui::{ActorId, ActorKind, SyntaxError, UiBuilder, UiTree};
use crate::world::{GameState, GameWorld, MapInfo, SimplePhysics, WorldError};
use log::{error, info};
use macroquad::prelude::{DARKGRAY, KeyCode, clear_background, get_frame_time, is_key_down, is_key_pressed, next_frame};
use std::rc::Rc;
use thiserror::Error;

const VEHICLE_NAME: &str = "player";

#[derive(Error, Debug)]
pub enum GameError {
    #[error("World setup failed: {0}")]
    World(#[from] WorldError),
    #[error("UI build failed: {0}")]
    Ui(#[from] SyntaxError),
    #[error("Invalid markup in '{name}': {source}")]
    Markup { name: String, source: MarkupError },
    #[error("Missing UI screen '{0}'")]
    MissingScreen(String),
    #[error("Cannot read '{path}': {source}")]
    Io { path: String, source: std::io::Error },
}

/// Player input for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    pub accelerate: bool,
    pub brake: bool,
    /// -1 right, 1 left
    pub direction: f32,
    pub turbo: bool,
    pub restart: bool,
}

impl Controls {
    pub fn from_keyboard() -> Self {
        let mut direction = 0.0;
        if is_key_down(KeyCode::Left) {
            direction += 1.0;
        }
        if is_key_down(KeyCode::Right) {
            direction -= 1.0;
        }
        Controls {
            accelerate: is_key_down(KeyCode::Up),
            brake: is_key_down(KeyCode::Down),
            direction,
            turbo: is_key_pressed(KeyCode::Space),
            restart: is_key_pressed(KeyCode::Enter),
        }
    }
}

/// Actors of the HUD the game updates every frame
#[derive(Debug, Clone, Copy)]
struct Hud {
    root: ActorId,
    score: ActorId,
    turbo: ActorId,
    state: ActorId,
    timings: Option<ActorId>,
}

/// Atlas regions referenced by the embedded screens
pub fn ui_atlas() -> TextureAtlas {
    TextureAtlas::new().with_patch("frame", 24, 24, [8, 8, 8, 8])
}

/// Builds an embedded screen and returns its root actor
pub fn build_screen(ui: &mut UiBuilder, name: &str) -> Result<ActorId, GameError> {
    let source = assets::ui_markup(name).ok_or_else(|| GameError::MissingScreen(name.to_string()))?;
    let root = markup::parse(&source).map_err(|source| GameError::Markup {
        name: name.to_string(),
        source,
    })?;
    ui.try_build(&root, None)?
        .ok_or_else(|| GameError::MissingScreen(name.to_string()))
}

fn define_screen_variables(ui: &mut UiBuilder, variables: &[(String, String)]) {
    ui.define_variable("screen_width", &config::WINDOW_WIDTH.to_string());
    ui.define_variable("screen_height", &config::WINDOW_HEIGHT.to_string());
    ui.define_variable("record_count", &config::RECORD_COUNT.to_string());
    for (name, value) in variables {
        ui.define_variable(name, value);
    }
}

pub fn set_label_text(tree: &mut UiTree, id: ActorId, value: impl Into<String>) {
    if let ActorKind::Label { text, .. } = &mut tree.get_mut(id).kind {
        *text = value.into();
    }
}

/// One race on a generated track, with its HUD and end of race panel
pub struct Game {
    seed: u64,
    map: MapInfo,
    world: GameWorld,
    ui: UiBuilder,
    hud: Hud,
    hud_actor_count: usize,
    finished_root: Option<ActorId>,
    stats: TrackStats,
    race_time: f32,
}

impl Game {
    /// `variables` are made available to the UI markup
    pub fn new(seed: u64, variables: &[(String, String)]) -> Result<Self, GameError> {
        let map = MapInfo::generate(seed, config::TRACK_LENGTH_TILES);
        let world = GameWorld::with_map(SimplePhysics::new(), &map)?;

        let mut ui = UiBuilder::new(ui_atlas(), Skin::with_defaults());
        define_screen_variables(&mut ui, variables);
        let root = build_screen(&mut ui, "hud")?;
        let hud = Hud {
            root,
            score: ui.actor("score"),
            turbo: ui.actor("turbo"),
            state: ui.actor("state"),
            timings: ui.find_actor("timings"),
        };
        let hud_actor_count = ui.tree().len();
        info!("Track generated from seed {}: {} obstacles", seed, map.obstacles().len());

        Ok(Game {
            seed,
            map,
            world,
            ui,
            hud,
            hud_actor_count,
            finished_root: None,
            stats: TrackStats::new(Rc::new(LogStatsIo)),
            race_time: 0.0,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GameWorld {
        &mut self.world
    }

    pub fn ui(&self) -> &UiBuilder {
        &self.ui
    }

    pub fn stats(&self) -> &TrackStats {
        &self.stats
    }

    pub fn race_time(&self) -> f32 {
        self.race_time
    }

    /// Root actors to draw, back to front
    pub fn ui_roots(&self) -> Vec<ActorId> {
        let mut roots = vec![self.hud.root];
        roots.extend(self.finished_root);
        roots
    }

    /// Advances the race by one frame
    pub fn update(&mut self, delta: f32, controls: &Controls) -> Result<(), GameError> {
        let running = self.world.state() == GameState::Running;
        if running {
            self.race_time += delta;
            if let Some(vehicle) = self.world.vehicle_mut() {
                vehicle.set_accelerating(controls.accelerate);
                vehicle.set_braking(controls.brake);
                vehicle.set_direction(controls.direction);
                if controls.turbo {
                    vehicle.trigger_turbo();
                }
            }
        } else if controls.restart {
            return self.restart();
        }

        self.world.act(delta);
        if running && self.world.state() != GameState::Running {
            self.on_race_over()?;
        }

        self.update_hud();
        let tree = self.ui.tree_mut();
        tree.act(delta);
        for root in [Some(self.hud.root), self.finished_root].into_iter().flatten() {
            tree.layout(root);
        }
        Ok(())
    }

    fn update_hud(&mut self) {
        let score = self.world.score();
        let turbo_active = self.world.vehicle().is_some_and(|vehicle| vehicle.turbo_time() >= 0.0);
        let state = self.world.state();
        let timings = self.world.timings();
        let tree = self.ui.tree_mut();

        set_label_text(tree, self.hud.score, score.to_string());
        tree.get_mut(self.hud.turbo).visible = turbo_active;
        let state_text = match state {
            GameState::Running => "",
            GameState::Broken => "BROKEN",
            GameState::Finished => "FINISHED",
        };
        set_label_text(tree, self.hud.state, state_text);
        tree.get_mut(self.hud.state).visible = state != GameState::Running;
        if let Some(id) = self.hud.timings {
            let text = format!(
                "physics {:.2} ms, objects {:.2} ms",
                timings.physics.as_secs_f64() * 1000.0,
                timings.game_objects.as_secs_f64() * 1000.0
            );
            set_label_text(tree, id, text);
        }
    }

    fn on_race_over(&mut self) -> Result<(), GameError> {
        let state = self.world.state();
        let outcome = match state {
            GameState::Finished => {
                let result = TrackResult::new(VEHICLE_NAME, self.race_time);
                let rank = self.stats.add_result(ResultType::Total, result.clone());
                self.stats.add_result(ResultType::Lap, result);
                match rank {
                    Some(rank) => format!("New record! Rank {} in {:.2}s", rank + 1, self.race_time),
                    None => format!("Finished in {:.2}s", self.race_time),
                }
            }
            _ => "Your vehicle broke down".to_string(),
        };
        info!("Race over after {:.2}s: {:?}, score {}", self.race_time, state, self.world.score());

        self.ui.define_variable("outcome", &outcome);
        self.ui.define_variable("final_score", &self.world.score().to_string());
        let root = build_screen(&mut self.ui, "finished")?;
        let records: Vec<String> = self
            .stats
            .get(ResultType::Total)
            .iter()
            .enumerate()
            .map(|(index, result)| format!("{}. {}", index + 1, result))
            .collect();
        for (index, text) in records.into_iter().enumerate() {
            if let Some(id) = self.ui.find_actor(&format!("record{}", index)) {
                set_label_text(self.ui.tree_mut(), id, text);
            }
        }
        self.finished_root = Some(root);
        Ok(())
    }

    /// Starts a new race on the same track; records are kept
    pub fn restart(&mut self) -> Result<(), GameError> {
        info!("Restarting race");
        self.world = GameWorld::with_map(SimplePhysics::new(), &self.map)?;
        self.ui.tree_mut().truncate(self.hud_actor_count);
        self.finished_root = None;
        self.race_time = 0.0;
        Ok(())
    }

    /// Runs the main loop until the window is closed
    pub async fn run(&mut self, renderer: &mut Renderer) -> Result<(), GameError> {
        info!("Starting main loop...");
        while !Renderer::window_should_close() {
            let controls = Controls::from_keyboard();
            self.update(get_frame_time(), &controls)?;
            renderer.draw_world(&self.world);
            renderer.draw_ui(self.ui.tree(), &self.ui_roots());
            next_frame().await;
        }
        info!("Exiting tinywheels.");
        Ok(())
    }
}

/// Shows a markup file from disk, rebuilt when R is pressed
pub struct UiPreview {
    path: String,
    variables: Vec<(String, String)>,
    ui: UiBuilder,
    root: Option<ActorId>,
}

impl UiPreview {
    pub fn new(path: impl Into<String>, variables: Vec<(String, String)>) -> Self {
        UiPreview {
            path: path.into(),
            variables,
            ui: UiBuilder::new(ui_atlas(), Skin::with_defaults()),
            root: None,
        }
    }

    /// Reads and builds the file again. A broken file keeps the previous
    /// content on screen.
    pub fn reload(&mut self) -> Result<(), GameError> {
        let source = std::fs::read_to_string(&self.path).map_err(|source| GameError::Io {
            path: self.path.clone(),
            source,
        })?;
        let root = markup::parse(&source).map_err(|source| GameError::Markup {
            name: self.path.clone(),
            source,
        })?;
        let mut ui = UiBuilder::new(ui_atlas(), Skin::with_defaults());
        define_screen_variables(&mut ui, &self.variables);
        let actor = ui.try_build(&root, None)?;
        info!("Loaded {}: {} actors", self.path, ui.tree().len());
        self.ui = ui;
        self.root = actor;
        Ok(())
    }

    pub fn ui(&self) -> &UiBuilder {
        &self.ui
    }

    pub fn update(&mut self, delta: f32) {
        let tree = self.ui.tree_mut();
        tree.act(delta);
        if let Some(root) = self.root {
            tree.layout(root);
        }
    }

    pub async fn run(&mut self, renderer: &mut Renderer) {
        if let Err(e) = self.reload() {
            error!("{}", e);
        }
        while !Renderer::window_should_close() {
            if is_key_pressed(KeyCode::R) {
                if let Err(e) = self.reload() {
                    error!("{}", e);
                }
            }
            self.update(get_frame_time());
            clear_background(DARKGRAY);
            renderer.draw_ui(self.ui.tree(), &self.root.into_iter().collect::<Vec<_>>());
            next_frame().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MapObject;
    use assert_approx_eq::assert_approx_eq;

    const FRAME: f32 = 1.0 / 30.0;

    fn game() -> Game {
        Game::new(7, &[]).unwrap()
    }

    fn label_text(game: &Game, id: ActorId) -> String {
        match &game.ui().tree().get(id).kind {
            ActorKind::Label { text, .. } => text.clone(),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    /// Replaces the track with an empty one, plus `kind` on the start position
    fn use_test_track(game: &mut Game, kind: Option<&str>) {
        let mut map = MapInfo::new(6, 40, config::TILE_SIZE_PX);
        map.set_center(2, 0, 1);
        let tile = config::TILE_SIZE_PX as f32;
        if let Some(kind) = kind {
            map.add_obstacle(MapObject::new(kind, 2.5 * tile - 10.0, tile - 10.0, 20.0, 20.0));
        }
        game.map = map;
        game.restart().unwrap();
    }

    #[test]
    fn test_hud_is_built_and_laid_out() {
        let mut game = game();
        game.update(FRAME, &Controls::default()).unwrap();
        let tree = game.ui().tree();
        let root = tree.get(game.hud.root);
        assert_approx_eq!(root.width, config::WINDOW_WIDTH as f32);
        assert_approx_eq!(root.height, config::WINDOW_HEIGHT as f32);
        // 0.5 grid from the top left corner
        let panel = tree.get(game.ui().actor("scorePanel"));
        assert_approx_eq!(panel.x, 10.0);
        assert_approx_eq!(panel.y + panel.height, config::WINDOW_HEIGHT as f32 - 10.0);
        assert!(game.hud.timings.is_none());
        assert_eq!(game.ui().tree().get(game.ui().actor("hint")).action_count(), 1);
    }

    #[test]
    fn test_debug_hud_variable() {
        let game = Game::new(7, &[("debug_hud".to_string(), "1".to_string())]).unwrap();
        assert!(game.hud.timings.is_some());
    }

    #[test]
    fn test_accelerating_updates_score() {
        let mut game = game();
        use_test_track(&mut game, None);
        let controls = Controls {
            accelerate: true,
            ..Default::default()
        };
        for _ in 0..30 {
            game.update(FRAME, &controls).unwrap();
        }
        assert!(game.world().score() > 0);
        assert_eq!(label_text(&game, game.hud.score), game.world().score().to_string());
        assert_approx_eq!(game.race_time(), 1.0, 1e-3);
    }

    #[test]
    fn test_finishing_records_result() {
        let mut game = game();
        use_test_track(&mut game, Some("finish"));
        game.update(FRAME, &Controls::default()).unwrap();
        assert_eq!(game.world().state(), GameState::Finished);
        assert_eq!(game.stats().get(ResultType::Total).len(), 1);
        assert_eq!(game.stats().get(ResultType::Lap).len(), 1);
        assert!(game.finished_root.is_some());
        assert_eq!(label_text(&game, game.hud.state), "FINISHED");
        assert!(label_text(&game, game.ui().actor("outcome")).starts_with("New record! Rank 1"));
        assert!(label_text(&game, game.ui().actor("record0")).starts_with("1. player"));
        assert_eq!(label_text(&game, game.ui().actor("record1")), "-");

        // The race time stops with the race
        let time = game.race_time();
        game.update(FRAME, &Controls::default()).unwrap();
        assert_approx_eq!(game.race_time(), time);
    }

    #[test]
    fn test_broken_vehicle_and_restart() {
        let mut game = game();
        use_test_track(&mut game, Some("mine"));
        game.update(FRAME, &Controls::default()).unwrap();
        assert_eq!(game.world().state(), GameState::Broken);
        assert!(game.stats().get(ResultType::Total).is_empty());
        assert_eq!(label_text(&game, game.ui().actor("outcome")), "Your vehicle broke down");

        let hud_actors = game.hud_actor_count;
        let restart = Controls {
            restart: true,
            ..Default::default()
        };
        game.update(FRAME, &restart).unwrap();
        assert_eq!(game.world().state(), GameState::Running);
        assert!(game.finished_root.is_none());
        assert_eq!(game.ui().tree().len(), hud_actors);
        assert_eq!(game.ui_roots(), vec![game.hud.root]);
    }

    #[test]
    fn test_turbo_label_follows_vehicle() {
        let mut game = game();
        use_test_track(&mut game, None);
        let turbo = Controls {
            turbo: true,
            ..Default::default()
        };
        game.update(FRAME, &turbo).unwrap();
        assert!(game.ui().tree().get(game.hud.turbo).visible);
        for _ in 0..30 {
            game.update(FRAME, &Controls::default()).unwrap();
        }
        assert!(!game.ui().tree().get(game.hud.turbo).visible);
    }

    #[test]
    fn test_preview_reload() {
        let path = std::env::temp_dir().join(format!("tinywheels-preview-{}.xml", std::process::id()));
        std::fs::write(&path, r#"<Ui><Label id="title" debug="true">${greeting}</Label></Ui>"#).unwrap();
        let variables = vec![("greeting".to_string(), "Hello".to_string())];
        let mut preview = UiPreview::new(path.to_string_lossy(), variables);
        preview.reload().unwrap();
        let title = preview.ui().actor("title");
        assert!(preview.ui().tree().is_debug(title));

        // A broken file keeps the previous tree
        std::fs::write(&path, "<Ui><Label></Ui>").unwrap();
        assert!(matches!(preview.reload(), Err(GameError::Markup { .. })));
        assert_eq!(preview.ui().tree().len(), 1);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(preview.reload(), Err(GameError::Io { .. })));
    }
}
