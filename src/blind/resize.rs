//! Bloqueo de proporción durante el redimensionado interactivo
//!
//! Windows envía WM_SIZING con el rectángulo propuesto en cada frame del
//! arrastre; aquí se reescribe ese rectángulo para que el área de contenido
//! (rectángulo exterior menos los márgenes del marco) se mantenga cuadrada.

/// Diferencia constante entre el tamaño exterior de la ventana y su área
/// de contenido, capturada una sola vez tras el primer layout.
///
/// Recalcularla a mitad de un arrastre corrompería el bloqueo, por eso la
/// ventana la guarda como `Option` y solo la escribe la primera vez.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeMargins {
    pub horizontal: i32,
    pub vertical: i32,
}

/// Rectángulo de ventana en coordenadas de pantalla
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WindowRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Los ocho bordes de arrastre de WM_SIZING (valores WMSZ_*)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Left,
    Right,
    Top,
    TopLeft,
    TopRight,
    Bottom,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    /// Decodifica el wparam de WM_SIZING
    pub fn from_wparam(wparam: usize) -> Option<Self> {
        match wparam {
            1 => Some(Self::Left),
            2 => Some(Self::Right),
            3 => Some(Self::Top),
            4 => Some(Self::TopLeft),
            5 => Some(Self::TopRight),
            6 => Some(Self::Bottom),
            7 => Some(Self::BottomLeft),
            8 => Some(Self::BottomRight),
            _ => None,
        }
    }
}

/// Reescribe el rectángulo propuesto para mantener el contenido cuadrado
///
/// La dimensión que gobierna es la que controla el usuario: en bordes
/// laterales y en las cuatro esquinas manda el ancho, en los bordes
/// superior/inferior manda el alto. La esquina opuesta al arrastre queda
/// fija píxel a píxel.
pub fn lock_aspect(edge: ResizeEdge, rect: WindowRect, margins: ResizeMargins) -> WindowRect {
    // Área de contenido implicada por el arrastre en curso
    let w = rect.right - rect.left - margins.horizontal;
    let h = rect.bottom - rect.top - margins.vertical;

    let mut out = rect;
    match edge {
        ResizeEdge::Left | ResizeEdge::Right => {
            out.bottom = rect.top + w + margins.vertical;
        }
        ResizeEdge::Top | ResizeEdge::Bottom => {
            out.right = rect.left + h + margins.horizontal;
        }
        ResizeEdge::TopLeft | ResizeEdge::TopRight => {
            out.top = rect.bottom - w - margins.vertical;
        }
        ResizeEdge::BottomLeft | ResizeEdge::BottomRight => {
            out.bottom = rect.top + w + margins.vertical;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGINS: ResizeMargins = ResizeMargins {
        horizontal: 8,
        vertical: 31,
    };

    fn content(rect: WindowRect, margins: ResizeMargins) -> (i32, i32) {
        (
            rect.right - rect.left - margins.horizontal,
            rect.bottom - rect.top - margins.vertical,
        )
    }

    /// Rectángulo con contenido 400x300 anclado en (100, 100)
    fn base_rect() -> WindowRect {
        WindowRect::new(100, 100, 100 + 400 + 8, 100 + 300 + 31)
    }

    #[test]
    fn arrastre_esquina_inferior_derecha_cuadra_el_contenido() {
        // Arrastre que implica contenido 500x300
        let dragged = WindowRect::new(100, 100, 100 + 500 + 8, 100 + 300 + 31);
        let out = lock_aspect(ResizeEdge::BottomRight, dragged, MARGINS);

        // Ancla superior-izquierda intacta, contenido 500x500
        assert_eq!(out.left, 100);
        assert_eq!(out.top, 100);
        assert_eq!(content(out, MARGINS), (500, 500));
    }

    #[test]
    fn borde_lateral_fuerza_el_alto_desde_el_ancho() {
        for edge in [ResizeEdge::Left, ResizeEdge::Right] {
            let dragged = WindowRect::new(50, 100, 50 + 250 + 8, 100 + 300 + 31);
            let out = lock_aspect(edge, dragged, MARGINS);

            // El borde superior es el ancla
            assert_eq!(out.top, 100);
            assert_eq!(content(out, MARGINS), (250, 250));
        }
    }

    #[test]
    fn borde_vertical_fuerza_el_ancho_desde_el_alto() {
        for edge in [ResizeEdge::Top, ResizeEdge::Bottom] {
            let dragged = WindowRect::new(100, 80, 100 + 400 + 8, 80 + 450 + 31);
            let out = lock_aspect(edge, dragged, MARGINS);

            // El borde izquierdo es el ancla
            assert_eq!(out.left, 100);
            assert_eq!(content(out, MARGINS), (450, 450));
        }
    }

    #[test]
    fn contenido_cuadrado_en_los_ocho_bordes() {
        let edges = [
            ResizeEdge::Left,
            ResizeEdge::Right,
            ResizeEdge::Top,
            ResizeEdge::TopLeft,
            ResizeEdge::TopRight,
            ResizeEdge::Bottom,
            ResizeEdge::BottomLeft,
            ResizeEdge::BottomRight,
        ];

        for edge in edges {
            let dragged = WindowRect::new(60, 90, 60 + 370 + 8, 90 + 220 + 31);
            let out = lock_aspect(edge, dragged, MARGINS);
            let (w, h) = content(out, MARGINS);
            assert_eq!(w, h, "contenido no cuadrado arrastrando {:?}", edge);
        }
    }

    #[test]
    fn la_esquina_opuesta_al_arrastre_no_se_mueve() {
        let rect = base_rect();

        // (borde, extractor de la esquina ancla)
        let cases: [(ResizeEdge, fn(WindowRect) -> (i32, i32)); 4] = [
            (ResizeEdge::TopLeft, |r| (r.right, r.bottom)),
            (ResizeEdge::TopRight, |r| (r.left, r.bottom)),
            (ResizeEdge::BottomLeft, |r| (r.right, r.top)),
            (ResizeEdge::BottomRight, |r| (r.left, r.top)),
        ];

        for (edge, anchor) in cases {
            let out = lock_aspect(edge, rect, MARGINS);
            assert_eq!(
                anchor(out),
                anchor(rect),
                "el ancla se movió arrastrando {:?}",
                edge
            );
        }
    }

    #[test]
    fn arrastre_esquina_superior_izquierda_recalcula_el_borde_superior() {
        // El usuario empuja el borde izquierdo hacia fuera: contenido 480x300
        let dragged = WindowRect::new(20, 100, 20 + 480 + 8, 100 + 300 + 31);
        let out = lock_aspect(ResizeEdge::TopLeft, dragged, MARGINS);

        assert_eq!(out.right, dragged.right);
        assert_eq!(out.bottom, dragged.bottom);
        assert_eq!(content(out, MARGINS), (480, 480));
    }

    #[test]
    fn margenes_cero_tambien_cuadran() {
        let zero = ResizeMargins {
            horizontal: 0,
            vertical: 0,
        };
        let dragged = WindowRect::new(0, 0, 300, 200);
        let out = lock_aspect(ResizeEdge::Right, dragged, zero);
        assert_eq!(content(out, zero), (300, 300));
    }

    #[test]
    fn wparam_decodifica_los_ocho_bordes() {
        assert_eq!(ResizeEdge::from_wparam(1), Some(ResizeEdge::Left));
        assert_eq!(ResizeEdge::from_wparam(2), Some(ResizeEdge::Right));
        assert_eq!(ResizeEdge::from_wparam(3), Some(ResizeEdge::Top));
        assert_eq!(ResizeEdge::from_wparam(4), Some(ResizeEdge::TopLeft));
        assert_eq!(ResizeEdge::from_wparam(5), Some(ResizeEdge::TopRight));
        assert_eq!(ResizeEdge::from_wparam(6), Some(ResizeEdge::Bottom));
        assert_eq!(ResizeEdge::from_wparam(7), Some(ResizeEdge::BottomLeft));
        assert_eq!(ResizeEdge::from_wparam(8), Some(ResizeEdge::BottomRight));
        assert_eq!(ResizeEdge::from_wparam(0), None);
        assert_eq!(ResizeEdge::from_wparam(9), None);
    }
}
