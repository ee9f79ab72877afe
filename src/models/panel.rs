use serde::{Deserialize, Serialize};

/// Dashboard panels, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelKind {
    /// Candles, MA5/MA20, Bollinger bands and the volume profile
    Price,
    Volume,
    /// Institutional net total bars
    Institutional,
    /// Margin balance change bars
    Margin,
    /// Broker buy/sell head-count difference bars
    Breadth,
    /// K and D lines
    Stochastic,
    /// DIF/DEA lines and histogram
    Macd,
}

impl PanelKind {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "price" | "candle" => Ok(PanelKind::Price),
            "volume" | "vol" => Ok(PanelKind::Volume),
            "institutional" | "inst" => Ok(PanelKind::Institutional),
            "margin" => Ok(PanelKind::Margin),
            "breadth" => Ok(PanelKind::Breadth),
            "stochastic" | "kd" | "kdj" => Ok(PanelKind::Stochastic),
            "macd" => Ok(PanelKind::Macd),
            _ => Err(format!(
                "Invalid panel: {}. Valid options: price, volume, institutional, margin, breadth, kd, macd",
                s
            )),
        }
    }

    /// Parse a comma-separated list, "default" or "all"
    ///
    /// The price panel is always first, whether or not it was listed.
    pub fn parse_panels(s: &str) -> Result<Vec<Self>, String> {
        match s.trim().to_lowercase().as_str() {
            "default" => return Ok(Self::default_set()),
            "all" => {
                return Ok(vec![
                    PanelKind::Price,
                    PanelKind::Volume,
                    PanelKind::Institutional,
                    PanelKind::Margin,
                    PanelKind::Breadth,
                    PanelKind::Stochastic,
                    PanelKind::Macd,
                ])
            }
            _ => {}
        }

        let mut panels = vec![PanelKind::Price];
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let panel = Self::from_str(part)?;
            if !panels.contains(&panel) {
                panels.push(panel);
            }
        }
        Ok(panels)
    }

    /// Price, volume, institutional and margin
    pub fn default_set() -> Vec<Self> {
        vec![
            PanelKind::Price,
            PanelKind::Volume,
            PanelKind::Institutional,
            PanelKind::Margin,
        ]
    }

    /// Relative height of the panel
    pub fn height_ratio(&self) -> u32 {
        match self {
            PanelKind::Price => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_panels_keeps_price_first() {
        let panels = PanelKind::parse_panels("macd, volume").unwrap();
        assert_eq!(panels, vec![PanelKind::Price, PanelKind::Macd, PanelKind::Volume]);
    }

    #[test]
    fn test_parse_panels_dedup_and_aliases() {
        let panels = PanelKind::parse_panels("kd,KDJ,price,inst").unwrap();
        assert_eq!(
            panels,
            vec![PanelKind::Price, PanelKind::Stochastic, PanelKind::Institutional]
        );
    }

    #[test]
    fn test_parse_panels_default_and_invalid() {
        assert_eq!(PanelKind::parse_panels("default").unwrap().len(), 4);
        assert_eq!(PanelKind::parse_panels("all").unwrap().len(), 7);
        assert!(PanelKind::parse_panels("volume,bogus").is_err());
    }
}
