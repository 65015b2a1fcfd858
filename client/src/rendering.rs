use crate::collision::Effect;
use crate::game::ClientGame;
use crate::level::{COIN_SIZE, DOOR_HEIGHT, DOOR_WIDTH, HOSTILE_HEIGHT, HOSTILE_WIDTH};
use crate::puzzle::KEY_SIZE;
use macroquad::prelude::*;
use shared::{PlayerId, PLAYER_SIZE, SWAP_COST};

const BACKGROUND: Color = Color::new(0.10, 0.10, 0.10, 1.0);
const PLATFORM: Color = Color::new(0.27, 0.27, 0.27, 1.0);
const REMOTE: Color = Color::new(1.0, 0.27, 0.27, 1.0);
const FLASH_SECONDS: f32 = 0.15;

pub struct Renderer {
    width: f32,
    height: f32,
    flash: Option<(Effect, f32)>,
}

impl Renderer {
    pub fn new(width: f32, height: f32) -> Self {
        Renderer {
            width,
            height,
            flash: None,
        }
    }

    /// Shows a short screen flash for the most recent effect.
    pub fn play_effects(&mut self, effects: &[Effect]) {
        if let Some(effect) = effects.last() {
            self.flash = Some((*effect, FLASH_SECONDS));
        }
    }

    pub fn render_connecting(&mut self, server: &str) {
        clear_background(BACKGROUND);
        let text = format!("Connecting to {}...", server);
        draw_text(&text, 20.0, self.height / 2.0, 28.0, WHITE);
    }

    pub fn render(&mut self, game: &ClientGame, dt: f32) {
        clear_background(BACKGROUND);

        let level = game.level();
        for platform in &level.platforms {
            draw_rectangle(platform.x, platform.y, platform.w, platform.h, PLATFORM);
        }

        for coin in level.coins.iter().filter(|coin| coin.alive) {
            draw_circle(coin.x, coin.y, COIN_SIZE / 2.0, GOLD);
        }

        for hostile in level.hostiles.iter().filter(|hostile| hostile.alive) {
            draw_rectangle(hostile.x, hostile.y, HOSTILE_WIDTH, HOSTILE_HEIGHT, PURPLE);
        }

        let door = level.door;
        draw_rectangle(
            door.x - DOOR_WIDTH / 2.0,
            door.y - DOOR_HEIGHT,
            DOOR_WIDTH,
            DOOR_HEIGHT,
            BROWN,
        );

        let key = game.puzzle().key();
        if key.alive {
            draw_rectangle(
                key.x - KEY_SIZE / 2.0,
                key.y - KEY_SIZE / 2.0,
                KEY_SIZE,
                KEY_SIZE,
                YELLOW,
            );
        }

        for remote in game.registry().live() {
            self.draw_player(remote.id, remote.x, remote.y, REMOTE, remote.has_key);
        }

        let hero = game.hero();
        self.draw_player(hero.id, hero.x, hero.y, GREEN, hero.has_key);

        self.draw_flash(dt);
        self.draw_hud(game);

        if let Some(score) = game.score() {
            self.draw_end_screen(score);
        }
    }

    fn draw_player(&self, id: PlayerId, x: f32, y: f32, color: Color, has_key: bool) {
        draw_rectangle(x, y, PLAYER_SIZE, PLAYER_SIZE, color);
        draw_rectangle_lines(x, y, PLAYER_SIZE, PLAYER_SIZE, 2.0, WHITE);
        draw_text(&id.to_string(), x + 2.0, y - 4.0, 16.0, WHITE);

        if has_key {
            draw_rectangle(x + PLAYER_SIZE / 2.0 - 4.0, y - 18.0, 8.0, 8.0, YELLOW);
        }
    }

    fn draw_flash(&mut self, dt: f32) {
        let Some((effect, remaining)) = self.flash else {
            return;
        };

        let color = match effect {
            Effect::Jump => SKYBLUE,
            Effect::Coin => GOLD,
            Effect::Stomp => PURPLE,
            Effect::Key => YELLOW,
            Effect::Door => GREEN,
        };
        let alpha = (remaining / FLASH_SECONDS).clamp(0.0, 1.0) * 0.25;
        draw_rectangle(0.0, 0.0, self.width, self.height, Color::new(color.r, color.g, color.b, alpha));

        let remaining = remaining - dt;
        self.flash = (remaining > 0.0).then_some((effect, remaining));
    }

    fn draw_hud(&self, game: &ClientGame) {
        let hero = game.hero();
        let coins = format!("Coins: {}", hero.coin_pickup_count);
        draw_text(&coins, 10.0, 24.0, 24.0, WHITE);

        let swap_color = if hero.coin_pickup_count >= SWAP_COST {
            GREEN
        } else {
            GRAY
        };
        draw_text(&format!("E: swap ({} coins)", SWAP_COST), 10.0, 48.0, 20.0, swap_color);

        let holder = match game.store().state().key_holder_id {
            Some(id) if id == hero.id => "Key: you".to_string(),
            Some(id) => format!("Key: player {}", id),
            None => "Key: free".to_string(),
        };
        draw_text(&holder, 10.0, 70.0, 20.0, WHITE);

        let players = format!("{} players", game.registry().len() + 1);
        draw_text(&players, self.width - 110.0, 24.0, 20.0, WHITE);
    }

    fn draw_end_screen(&self, score: u32) {
        draw_rectangle(0.0, 0.0, self.width, self.height, Color::new(0.0, 0.0, 0.0, 0.6));
        draw_text("Level complete!", self.width / 2.0 - 120.0, self.height / 2.0 - 20.0, 40.0, WHITE);
        draw_text(
            &format!("Score: {}", score),
            self.width / 2.0 - 60.0,
            self.height / 2.0 + 24.0,
            32.0,
            GOLD,
        );
        draw_text(
            "Press Escape to quit",
            self.width / 2.0 - 100.0,
            self.height / 2.0 + 60.0,
            20.0,
            LIGHTGRAY,
        );
    }
}
