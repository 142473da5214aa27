// src/fechas.rs
//
// Utilidades de fechas en tiempo civil local. El sistema trabaja
// deliberadamente sin normalización de zonas horarias: todos los instantes
// se interpretan en el calendario civil del servidor.
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};

use crate::models::disponibilidad::DIAS_ES;

const MESES_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Intenta interpretar una fecha/hora enviada por el cliente. Acepta ISO-8601
/// con o sin zona horaria; con zona, el instante se proyecta a hora local.
pub fn parsear_fecha(texto: &str) -> Option<NaiveDateTime> {
    let texto = texto.trim();

    if let Ok(con_zona) = chrono::DateTime::parse_from_rfc3339(texto) {
        return Some(con_zona.with_timezone(&chrono::Local).naive_local());
    }

    for formato in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(fecha) = NaiveDateTime::parse_from_str(texto, formato) {
            return Some(fecha);
        }
    }

    // Una fecha pelada cuenta como la medianoche de ese día.
    if let Ok(dia) = chrono::NaiveDate::parse_from_str(texto, "%Y-%m-%d") {
        return Some(dia.and_time(NaiveTime::MIN));
    }

    None
}

/// Semana civil lunes-domingo que contiene al instante de referencia:
/// desde el lunes 00:00:00.000 hasta el lunes siguiente menos 1 ms
/// (domingo 23:59:59.999).
pub fn rango_semana(referencia: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let dias_desde_lunes = referencia.date().weekday().num_days_from_monday() as i64;
    let lunes = referencia.date() - Duration::days(dias_desde_lunes);

    let inicio = lunes.and_time(NaiveTime::MIN);
    let fin = inicio + Duration::days(7) - Duration::milliseconds(1);
    (inicio, fin)
}

/// Fecha legible en español para las notificaciones,
/// ej. "lunes, 2 de junio de 2025, 09:00".
pub fn formatear_fecha(fecha: NaiveDateTime) -> String {
    let dia_semana = DIAS_ES[fecha.weekday().num_days_from_sunday() as usize];
    let mes = MESES_ES[fecha.month0() as usize];
    format!(
        "{}, {} de {} de {}, {:02}:{:02}",
        dia_semana,
        fecha.day(),
        mes,
        fecha.year(),
        fecha.hour(),
        fecha.minute()
    )
}

/// Duración legible: "45 minutos", "1 hora", "2h 30min".
pub fn formatear_duracion(minutos: i64) -> String {
    if minutos < 60 {
        return format!("{} minutos", minutos);
    }
    let horas = minutos / 60;
    let resto = minutos % 60;
    if resto > 0 {
        format!("{}h {}min", horas, resto)
    } else if horas > 1 {
        format!("{} horas", horas)
    } else {
        "1 hora".to_string()
    }
}
