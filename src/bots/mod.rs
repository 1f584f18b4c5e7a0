//! Bot roster and personalities.
//!
//! Profiles are plain data constructed up front and passed explicitly to
//! the engine and the outcome source. There is no shared registry and no
//! global singleton; each bot's mutable state lives with the engine task.

/// Trading temperament of a simulated bot. Drives the simulation
/// parameters only; the performance aggregation treats all bots alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotPersonality {
    Steady,
    Momentum,
    Quant,
    Contrarian,
}

impl BotPersonality {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Steady => "Steady Hand",
            Self::Momentum => "Momentum Chaser",
            Self::Quant => "Quant",
            Self::Contrarian => "Contrarian",
        }
    }

    pub fn blurb(&self) -> &'static str {
        match self {
            Self::Steady => "Trades rarely, cuts losses early, compounds slowly.",
            Self::Momentum => "Chases every move. Big winners, big drawdowns.",
            Self::Quant => "Signal-driven with tight sizing discipline.",
            Self::Contrarian => "Fades the crowd. Right about half the time.",
        }
    }
}

/// Simulation parameters for one bot.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BotProfile {
    pub id: String,
    pub name: String,
    pub personality: BotPersonality,

    /// Probability of closing a trade on any given tick, in [0, 1].
    pub trade_probability: f64,
    /// Probability that a closed trade is a winner, in [0, 1].
    pub win_bias: f64,
    /// Mean profit magnitude for winners, in dollars.
    pub avg_win_size: f64,
    /// Mean loss magnitude for losers, in dollars.
    pub avg_loss_size: f64,
    /// Position size range, in units.
    pub min_size: f64,
    pub max_size: f64,
    /// Symbols this bot trades; picked uniformly per outcome.
    pub symbols: Vec<String>,
}

impl BotProfile {
    pub fn steady() -> Self {
        Self {
            id: "steady".into(),
            name: "Steady Hand".into(),
            personality: BotPersonality::Steady,
            trade_probability: 0.06,
            win_bias: 0.58,
            avg_win_size: 40.0,
            avg_loss_size: 30.0,
            min_size: 0.5,
            max_size: 2.0,
            symbols: vec!["EUR-USD".into(), "XAU-USD".into()],
        }
    }

    pub fn momentum() -> Self {
        Self {
            id: "momentum".into(),
            name: "Momentum Chaser".into(),
            personality: BotPersonality::Momentum,
            trade_probability: 0.30,
            win_bias: 0.45,
            avg_win_size: 120.0,
            avg_loss_size: 65.0,
            min_size: 1.0,
            max_size: 10.0,
            symbols: vec!["BTC-USD".into(), "ETH-USD".into(), "SOL-USD".into()],
        }
    }

    pub fn quant() -> Self {
        Self {
            id: "quant".into(),
            name: "Quant".into(),
            personality: BotPersonality::Quant,
            trade_probability: 0.15,
            win_bias: 0.55,
            avg_win_size: 60.0,
            avg_loss_size: 45.0,
            min_size: 1.0,
            max_size: 4.0,
            symbols: vec!["BTC-USD".into(), "EUR-USD".into(), "SPX-USD".into()],
        }
    }

    pub fn contrarian() -> Self {
        Self {
            id: "contrarian".into(),
            name: "Contrarian".into(),
            personality: BotPersonality::Contrarian,
            trade_probability: 0.10,
            win_bias: 0.50,
            avg_win_size: 85.0,
            avg_loss_size: 70.0,
            min_size: 0.5,
            max_size: 5.0,
            symbols: vec!["ETH-USD".into(), "XAU-USD".into()],
        }
    }
}

/// The default arena roster, one bot per personality.
pub fn default_roster() -> Vec<BotProfile> {
    vec![
        BotProfile::steady(),
        BotProfile::momentum(),
        BotProfile::quant(),
        BotProfile::contrarian(),
    ]
}
