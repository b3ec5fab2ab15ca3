use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use panelflow::boundary_layer::edge::split_at_stagnation;
use panelflow::{
    naca4, AirfoilSurface, AnalysisConfig, FlowCondition, PreparedSection, Regime, SectionAnalysis,
    SurfaceSide,
};

const UPPER_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 100, 100);
const LOWER_COLOR: egui::Color32 = egui::Color32::from_rgb(100, 100, 255);

/// Plot-ready series for one analysis.
#[derive(Default)]
struct Curves {
    surface: Vec<[f64; 2]>,
    cp_upper: Vec<[f64; 2]>,
    cp_lower: Vec<[f64; 2]>,
    theta_upper: Vec<[f64; 2]>,
    theta_lower: Vec<[f64; 2]>,
    transitions: Vec<[f64; 2]>,
}

impl Curves {
    fn build(surface: &AirfoilSurface, prepared: &PreparedSection, result: &SectionAnalysis) -> Self {
        let geometry = prepared.solver().geometry();
        let panels = geometry.panels();
        let cp = &result.field.pressure_coefficient;

        // -Cp against x, suction up
        let cp_series = |indices: &[usize]| -> Vec<[f64; 2]> {
            indices
                .iter()
                .map(|&j| [panels[j].control_point.x, -cp[j]])
                .collect()
        };
        let (cp_upper, cp_lower) = match split_at_stagnation(geometry, &result.field) {
            Ok(split) => (cp_series(&split.upper_panels), cp_series(&split.lower_panels)),
            Err(err) => {
                log::warn!("no stagnation split for plotting: {}", err);
                (Vec::new(), Vec::new())
            }
        };

        let mut curves = Self {
            surface: surface.points().iter().map(|p| [p.x, p.y]).collect(),
            cp_upper,
            cp_lower,
            ..Self::default()
        };

        if let Some(bl) = &result.boundary_layer {
            for side in [SurfaceSide::Upper, SurfaceSide::Lower] {
                let layer = bl.side(side);
                // θ in thousandths of chord
                let theta: Vec<[f64; 2]> = layer
                    .stations()
                    .filter(|(regime, station)| {
                        // Transition station appears once in each profile
                        *regime == Regime::Laminar
                            || Some(station.arc_length) != layer.transition.arc_length()
                    })
                    .map(|(_, station)| [station.arc_length, station.momentum_thickness * 1e3])
                    .collect();
                if let (Some(point), Some(last)) = (layer.transition.point(), layer.laminar.last()) {
                    curves
                        .transitions
                        .push([point.arc_length, last.momentum_thickness * 1e3]);
                }
                match side {
                    SurfaceSide::Upper => curves.theta_upper = theta,
                    SurfaceSide::Lower => curves.theta_lower = theta,
                }
            }
        }
        curves
    }
}

struct SectionViewer {
    config: AnalysisConfig,
    naca_code: String,
    num_panels: usize,
    alpha_deg: f64,
    log_reynolds: f64,
    show_panels: bool,
    result: Option<SectionAnalysis>,
    curves: Curves,
    error: Option<String>,
}

impl SectionViewer {
    fn new(_cc: &eframe::CreationContext<'_>, config: AnalysisConfig) -> Self {
        let mut viewer = Self {
            config,
            naca_code: "2412".to_string(),
            num_panels: 120,
            alpha_deg: 4.0,
            log_reynolds: 6.0,
            show_panels: false,
            result: None,
            curves: Curves::default(),
            error: None,
        };
        viewer.run_analysis();
        viewer
    }

    fn reynolds(&self) -> f64 {
        10f64.powf(self.log_reynolds)
    }

    fn run_analysis(&mut self) {
        match self.analyze() {
            Ok((result, curves)) => {
                self.result = Some(result);
                self.curves = curves;
                self.error = None;
            }
            Err(err) => {
                log::error!("analysis of NACA {} failed: {}", self.naca_code, err);
                self.result = None;
                self.curves = Curves::default();
                self.error = Some(err.to_string());
            }
        }
    }

    fn analyze(&self) -> panelflow::Result<(SectionAnalysis, Curves)> {
        let surface = naca4(&self.naca_code, self.num_panels)?;
        let prepared = PreparedSection::new(&surface, &self.config)?;
        let condition = FlowCondition::from_degrees(self.alpha_deg, self.reynolds());
        let result = prepared.analyze(condition, &self.config)?;
        let curves = Curves::build(&surface, &prepared, &result);
        Ok((result, curves))
    }

    fn show_coefficients(&self, ui: &mut egui::Ui) {
        let Some(result) = &self.result else {
            ui.label("Run an analysis to see coefficients");
            return;
        };
        let c = &result.coefficients;
        ui.heading("Section Coefficients");
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(format!("Lift Coefficient (Cl): {:.4}", c.cl));
                    ui.label(format!("Pressure Drag (Cd,p): {:.5}", c.cd_pressure));
                    match c.cd_viscous {
                        Some(cd) => ui.label(format!("Profile Drag (Cd): {:.5}", cd)),
                        None => ui.label("Profile Drag (Cd): boundary layer off"),
                    };
                    ui.label(format!("Moment Coefficient (Cm): {:.4}", c.cm));
                    ui.label(format!("Lift-to-Drag Ratio (L/D): {:.1}", c.lift_to_drag()));
                });
            });

        if let Some(bl) = &result.boundary_layer {
            ui.separator();
            ui.heading("Boundary Layer");
            for side in [SurfaceSide::Upper, SurfaceSide::Lower] {
                let layer = bl.side(side);
                let text = match layer.transition.arc_length() {
                    Some(s) => format!("{:?}: transition at s = {:.3}", side, s),
                    None => format!("{:?}: fully laminar", side),
                };
                ui.label(text);
            }
            let recoveries = result.recovery_count();
            if recoveries > 0 {
                ui.colored_label(
                    egui::Color32::YELLOW,
                    format!("{} numerical recoveries", recoveries),
                );
            } else {
                ui.label("No numerical recoveries");
            }
        }
    }
}

impl eframe::App for SectionViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls").show(ctx, |ui| {
            ui.heading("Analysis Controls");

            ui.horizontal(|ui| {
                ui.label("NACA:");
                ui.text_edit_singleline(&mut self.naca_code);
            });

            ui.add(egui::Slider::new(&mut self.alpha_deg, -10.0..=15.0).text("Angle of Attack (°)"));
            ui.add(
                egui::Slider::new(&mut self.log_reynolds, 4.0..=7.5)
                    .text("log10 Reynolds"),
            );
            ui.label(format!("Re = {:.3e}", self.reynolds()));
            ui.add(
                egui::Slider::new(&mut self.num_panels, 20..=240)
                    .step_by(2.0)
                    .text("Panels"),
            );
            ui.checkbox(&mut self.config.boundary_layer.enabled, "Boundary Layer");
            ui.checkbox(&mut self.show_panels, "Show Panel Nodes");

            if ui.button("Run Analysis").clicked() {
                self.run_analysis();
            }

            if let Some(err) = &self.error {
                ui.colored_label(egui::Color32::RED, err);
            }

            ui.separator();
            self.show_coefficients(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let height = (ui.available_height() / 3.0 - 10.0).max(120.0);

            Plot::new("surface_plot")
                .height(height)
                .data_aspect(1.0)
                .include_x(-0.05)
                .include_x(1.05)
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new(PlotPoints::new(self.curves.surface.clone()))
                            .color(egui::Color32::DARK_RED)
                            .width(2.0),
                    );
                    if self.show_panels {
                        plot_ui.points(Points::new(self.curves.surface.clone()).radius(2.0));
                    }
                });

            Plot::new("cp_plot")
                .height(height)
                .legend(Legend::default())
                .y_axis_label("-Cp")
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new(self.curves.cp_upper.clone())
                            .color(UPPER_COLOR)
                            .width(2.0)
                            .name("Upper Surface"),
                    );
                    plot_ui.line(
                        Line::new(self.curves.cp_lower.clone())
                            .color(LOWER_COLOR)
                            .width(2.0)
                            .name("Lower Surface"),
                    );
                });

            Plot::new("theta_plot")
                .height(height)
                .legend(Legend::default())
                .x_axis_label("s / c")
                .y_axis_label("θ × 1000")
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new(self.curves.theta_upper.clone())
                            .color(UPPER_COLOR)
                            .width(2.0)
                            .name("Upper Surface"),
                    );
                    plot_ui.line(
                        Line::new(self.curves.theta_lower.clone())
                            .color(LOWER_COLOR)
                            .width(2.0)
                            .name("Lower Surface"),
                    );
                    plot_ui.points(
                        Points::new(self.curves.transitions.clone())
                            .radius(4.0)
                            .color(egui::Color32::YELLOW)
                            .name("Transition"),
                    );
                });
        });
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match AnalysisConfig::from_file(&path) {
            Ok(config) => {
                log::info!("loaded configuration from {}", path);
                config
            }
            Err(err) => {
                log::error!("{}: {}; using defaults", path, err);
                AnalysisConfig::default()
            }
        },
        None => AnalysisConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Panel Flow",
        options,
        Box::new(move |cc| Box::new(SectionViewer::new(cc, config))),
    )
}
