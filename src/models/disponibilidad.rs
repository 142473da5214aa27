// src/models/disponibilidad.rs
//
// Disponibilidad semanal de un tutor: un objeto JSON que mapea el nombre de
// un día ("lunes", "miércoles"...) a una lista de rangos "HH:MM-HH:MM".
// Las claves se aceptan con o sin tilde; los rangos son semiabiertos
// [inicio, fin): las 08:00 valen, las 10:00 ya no.
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde_json::Value;

/// Nombres de los días en español, indexados como chrono:
/// 0 = domingo ... 6 = sábado.
pub const DIAS_ES: [&str; 7] = [
    "domingo",
    "lunes",
    "martes",
    "miercoles",
    "jueves",
    "viernes",
    "sabado",
];

/// Disponibilidad ya normalizada: clave = día sin tildes y en minúsculas,
/// valor = los rangos tal como los declaró el tutor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disponibilidad {
    dias: BTreeMap<String, Vec<String>>,
}

impl Disponibilidad {
    /// Interpreta el JSON guardado en la columna `disponibilidad`. Devuelve
    /// `None` si el texto no es un objeto JSON: el llamador lo trata como
    /// "sin disponibilidad configurada" y rechaza la reserva.
    pub fn parse(texto: &str) -> Option<Disponibilidad> {
        let valor: Value = serde_json::from_str(texto).ok()?;
        Self::desde_valor(&valor)
    }

    pub fn desde_valor(valor: &Value) -> Option<Disponibilidad> {
        let objeto = valor.as_object()?;

        let mut dias = BTreeMap::new();
        for (clave, rangos) in objeto {
            // Un valor que no es lista cuenta como día sin atención.
            let rangos = match rangos.as_array() {
                Some(lista) => lista
                    .iter()
                    .filter_map(|r| r.as_str().map(str::to_owned))
                    .collect(),
                None => Vec::new(),
            };
            dias.insert(normalizar_clave(clave), rangos);
        }

        Some(Disponibilidad { dias })
    }

    /// Validación en la frontera de escritura (registro / edición de perfil):
    /// rechaza estructuras malformadas en lugar de tolerarlas al leer.
    pub fn validar(valor: &Value) -> Result<(), String> {
        let objeto = match valor.as_object() {
            Some(o) => o,
            None => return Err("La disponibilidad debe ser un objeto JSON".to_string()),
        };

        for (dia, rangos) in objeto {
            let lista = match rangos.as_array() {
                Some(l) => l,
                None => {
                    return Err(format!(
                        "La disponibilidad de '{}' debe ser una lista de rangos",
                        dia
                    ));
                }
            };
            for rango in lista {
                let texto = match rango.as_str() {
                    Some(t) => t,
                    None => return Err(format!("Rango no textual en '{}'", dia)),
                };
                if parsear_rango(texto).is_none() {
                    return Err(format!(
                        "Rango inválido '{}' en '{}' (formato esperado HH:MM-HH:MM)",
                        texto, dia
                    ));
                }
            }
        }

        Ok(())
    }

    /// ¿El tutor declaró al menos un rango para el día del instante pedido?
    pub fn atiende_dia(&self, fecha: NaiveDateTime) -> bool {
        self.atiende_dia_en(fecha, &DIAS_ES)
    }

    /// ¿Algún rango del día cubre la hora pedida? Inicio inclusivo, fin
    /// exclusivo; los rangos no interpretables se saltan sin error.
    pub fn cubre(&self, fecha: NaiveDateTime) -> bool {
        self.cubre_en(fecha, &DIAS_ES)
    }

    // Las variantes `_en` reciben la tabla de nombres de día explícitamente;
    // el calendario queda inyectado en lugar de fijado dentro del matcher.
    pub fn atiende_dia_en(&self, fecha: NaiveDateTime, dias: &[&str; 7]) -> bool {
        self.rangos_del_dia(fecha, dias)
            .map(|rangos| !rangos.is_empty())
            .unwrap_or(false)
    }

    pub fn cubre_en(&self, fecha: NaiveDateTime, dias: &[&str; 7]) -> bool {
        let rangos = match self.rangos_del_dia(fecha, dias) {
            Some(r) => r,
            None => return false,
        };

        // Minuto del día pedido; los segundos se ignoran.
        let t = fecha.hour() * 60 + fecha.minute();

        rangos
            .iter()
            .filter_map(|r| parsear_rango(r))
            .any(|(inicio, fin)| inicio <= t && t < fin)
    }

    fn rangos_del_dia(&self, fecha: NaiveDateTime, dias: &[&str; 7]) -> Option<&Vec<String>> {
        let dia = nombre_dia_en(fecha, dias);
        self.dias.get(&normalizar_clave(dia))
    }
}

/// Nombre en español del día de la semana de un instante.
pub fn nombre_dia(fecha: NaiveDateTime) -> &'static str {
    DIAS_ES[fecha.weekday().num_days_from_sunday() as usize]
}

fn nombre_dia_en<'a>(fecha: NaiveDateTime, dias: &[&'a str; 7]) -> &'a str {
    dias[fecha.weekday().num_days_from_sunday() as usize]
}

/// Minúsculas y sin tildes: "Miércoles" -> "miercoles".
pub fn normalizar_clave(texto: &str) -> String {
    texto
        .trim()
        .chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' | 'ü' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            otro => otro.to_ascii_lowercase(),
        })
        .collect()
}

/// "08:00-10:00" -> (480, 600) en minutos desde medianoche.
fn parsear_rango(texto: &str) -> Option<(u32, u32)> {
    let (inicio, fin) = texto.split_once('-')?;
    Some((minutos(inicio)?, minutos(fin)?))
}

fn minutos(hhmm: &str) -> Option<u32> {
    let (h, m) = hhmm.trim().split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    Some(h * 60 + m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    // lunes 2 de junio de 2025
    fn lunes(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn disponibilidad(v: serde_json::Value) -> Disponibilidad {
        Disponibilidad::desde_valor(&v).unwrap()
    }

    #[test]
    fn rango_semiabierto_inicio_inclusivo_fin_exclusivo() {
        let disp = disponibilidad(json!({ "lunes": ["08:00-10:00"] }));

        assert!(disp.cubre(lunes(8, 0)));
        assert!(disp.cubre(lunes(9, 59)));
        assert!(!disp.cubre(lunes(10, 0)));
        assert!(!disp.cubre(lunes(7, 59)));
    }

    #[test]
    fn los_segundos_se_ignoran() {
        let disp = disponibilidad(json!({ "lunes": ["08:00-10:00"] }));
        let con_segundos = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(9, 59, 59)
            .unwrap();
        assert!(disp.cubre(con_segundos));
    }

    #[test]
    fn varios_rangos_son_alternativas_independientes() {
        let disp = disponibilidad(json!({ "lunes": ["08:00-10:00", "14:00-16:00"] }));

        assert!(disp.cubre(lunes(15, 0)));
        assert!(!disp.cubre(lunes(12, 0)));
    }

    #[test]
    fn claves_con_tilde_y_sin_tilde_son_equivalentes() {
        let disp = disponibilidad(json!({ "Miércoles": ["08:00-10:00"] }));
        // miércoles 4 de junio de 2025
        let miercoles = NaiveDate::from_ymd_opt(2025, 6, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        assert!(disp.cubre(miercoles));
        assert!(disp.atiende_dia(miercoles));
    }

    #[test]
    fn dia_ausente_o_vacio_no_atiende() {
        let sin_dia = disponibilidad(json!({ "martes": ["08:00-10:00"] }));
        assert!(!sin_dia.atiende_dia(lunes(9, 0)));

        let vacio = disponibilidad(json!({ "lunes": [] }));
        assert!(!vacio.atiende_dia(lunes(9, 0)));

        // Valor que no es lista: el día queda sin atención, no es fatal.
        let no_lista = disponibilidad(json!({ "lunes": "08:00-10:00" }));
        assert!(!no_lista.atiende_dia(lunes(9, 0)));
    }

    #[test]
    fn rangos_invalidos_se_saltan_sin_romper_el_resto() {
        let disp = disponibilidad(json!({ "lunes": ["xx:yy-10:00", "14:00-16:00"] }));

        assert!(disp.cubre(lunes(15, 0)));
        assert!(!disp.cubre(lunes(9, 0)));
    }

    #[test]
    fn texto_no_objeto_no_parsea() {
        assert!(Disponibilidad::parse("no es json").is_none());
        assert!(Disponibilidad::parse("[1, 2]").is_none());
        assert!(Disponibilidad::parse("{\"lunes\": [\"08:00-10:00\"]}").is_some());
    }

    #[test]
    fn validar_rechaza_estructuras_malformadas() {
        assert!(Disponibilidad::validar(&json!(["lunes"])).is_err());
        assert!(Disponibilidad::validar(&json!({ "lunes": "08:00" })).is_err());
        assert!(Disponibilidad::validar(&json!({ "lunes": ["ocho a diez"] })).is_err());
        assert!(Disponibilidad::validar(&json!({ "lunes": [123] })).is_err());
        assert!(Disponibilidad::validar(&json!({ "lunes": ["08:00-10:00"], "martes": [] })).is_ok());
    }

    #[test]
    fn normalizacion_de_claves() {
        assert_eq!(normalizar_clave("Miércoles"), "miercoles");
        assert_eq!(normalizar_clave("SÁBADO"), "sabado");
        assert_eq!(normalizar_clave(" lunes "), "lunes");
    }

    #[test]
    fn nombre_de_dia_en_espanol() {
        assert_eq!(nombre_dia(lunes(9, 0)), "lunes");
        let domingo = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(nombre_dia(domingo), "domingo");
    }
}
